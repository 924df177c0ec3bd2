//! Line-oriented search & replace console
//!
//! Reads one command per line, drives a [`SearchSession`] against a chat
//! host, and reports outcomes as short notices. Commands start with `/`;
//! any other text is searched for directly.

use crate::chat::MessageContent;
use crate::config::DisplayConfig;
use crate::error::AppError;
use crate::host::ChatHost;
use crate::search::{FindOptions, SearchSession};
use std::fmt;
use std::io::Write;
use tokio::io::AsyncBufReadExt;

/// A parsed console command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Search for the given text
    Find(String),
    /// Select the next result
    Next,
    /// Select the previous result
    Prev,
    /// Show the selected result
    Show,
    /// List all results
    List,
    /// Replace in the selected message (reuses the last replacement if none given)
    Replace(Option<String>),
    /// Replace in every matched message
    ReplaceAll(Option<String>),
    /// Toggle regex mode
    ToggleRegex,
    /// Toggle case sensitivity
    ToggleCase,
    /// Toggle whole word matching
    ToggleWord,
    /// Drop the current results
    Clear,
    /// Re-read the chat and start over
    Reload,
    /// Show command help
    Help,
    /// Leave the console
    Quit,
}

/// Parse one input line.
///
/// Only the line terminator is stripped so queries may keep surrounding spaces.
pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return Err("Type a search or /help".to_string());
    }

    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Command::Find(line.to_string()));
    };

    let (name, arg) = match rest.split_once(' ') {
        Some((name, arg)) => (name, Some(arg.to_string())),
        None => (rest, None),
    };

    let command = match name {
        "find" | "f" => Command::Find(arg.unwrap_or_default()),
        "next" | "n" => Command::Next,
        "prev" | "p" => Command::Prev,
        "show" | "s" => Command::Show,
        "list" | "ls" => Command::List,
        "replace" | "r" => Command::Replace(arg),
        "replace-all" | "ra" => Command::ReplaceAll(arg),
        "regex" => Command::ToggleRegex,
        "case" => Command::ToggleCase,
        "word" => Command::ToggleWord,
        "clear" => Command::Clear,
        "reload" => Command::Reload,
        "help" | "h" | "?" => Command::Help,
        "quit" | "q" | "exit" => Command::Quit,
        other => return Err(format!("Unknown command: /{}", other)),
    };
    Ok(command)
}

/// Transient notification shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Success(String),
    Warning(String),
    Error(String),
    /// Multi-line result output
    Block(String),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Info(msg) => write!(f, "  {}", msg),
            Notice::Success(msg) => write!(f, "✓ {}", msg),
            Notice::Warning(msg) => write!(f, "! {}", msg),
            Notice::Error(msg) => write!(f, "✗ {}", msg),
            Notice::Block(text) => write!(f, "{}", text),
        }
    }
}

impl Notice {
    /// Whether this notice reports a failure
    pub fn is_error(&self) -> bool {
        matches!(self, Notice::Error(_))
    }
}

impl From<AppError> for Notice {
    fn from(err: AppError) -> Self {
        match &err {
            AppError::Search(e) if e.is_warning() => Notice::Warning(e.user_message()),
            _ => {
                log::error!("{}", err);
                Notice::Error(err.user_message())
            }
        }
    }
}

const HELP: &str = "\
Commands:
  <text> | /find <text>     Search the chat
  /next, /prev              Move through results
  /show, /list              Show the selected result / all results
  /replace [text]           Replace matches in the selected message
  /replace-all [text]       Replace matches in every matched message
  /regex, /case, /word      Toggle regex, case-sensitive, whole-word
  /clear                    Drop the current results
  /reload                   Re-read the chat and start over
  /quit                     Leave";

/// Console state: the host, the active search, and the last replacement
pub struct Console {
    host: Box<dyn ChatHost>,
    session: SearchSession,
    display: DisplayConfig,
    replacement: String,
}

impl Console {
    /// Create a console over a host
    pub fn new(host: Box<dyn ChatHost>, options: FindOptions, display: DisplayConfig) -> Self {
        Self {
            host,
            session: SearchSession::new(options),
            display,
            replacement: String::new(),
        }
    }

    /// The active search session
    #[cfg(test)]
    pub fn session(&self) -> &SearchSession {
        &self.session
    }

    /// Run one command and collect what should be shown
    pub async fn execute(&mut self, command: Command) -> Vec<Notice> {
        match command {
            Command::Find(query) => self.find(query).await,
            Command::Next => {
                self.session.next_result();
                self.show()
            }
            Command::Prev => {
                self.session.prev_result();
                self.show()
            }
            Command::Show => self.show(),
            Command::List => self.list(),
            Command::Replace(text) => {
                self.remember_replacement(text);
                match self
                    .session
                    .replace_current(self.host.as_mut(), &self.replacement)
                    .await
                {
                    Ok(index) => {
                        let mut notices =
                            vec![Notice::Success(format!("Replaced in message #{}", index))];
                        notices.extend(self.show());
                        notices
                    }
                    Err(e) => vec![e.into()],
                }
            }
            Command::ReplaceAll(text) => {
                self.remember_replacement(text);
                if self.session.results().is_empty() {
                    return vec![Notice::Warning("Nothing to replace".to_string())];
                }
                match self
                    .session
                    .replace_all(self.host.as_mut(), &self.replacement)
                    .await
                {
                    Ok(summary) => {
                        let mut notices = vec![Notice::Success(format!(
                            "Replacement complete: {} messages updated",
                            summary.succeeded
                        ))];
                        if summary.failed > 0 {
                            notices.push(Notice::Error(format!(
                                "{} messages could not be updated",
                                summary.failed
                            )));
                        }
                        notices
                    }
                    Err(e) => vec![e.into()],
                }
            }
            Command::ToggleRegex => {
                let on = self.session.toggle_regex();
                vec![Notice::Info(format!("Regex {}", on_off(on)))]
            }
            Command::ToggleCase => {
                let on = self.session.toggle_case_sensitive();
                vec![Notice::Info(format!("Case sensitive {}", on_off(on)))]
            }
            Command::ToggleWord => {
                let on = self.session.toggle_whole_word();
                vec![Notice::Info(format!("Whole word {}", on_off(on)))]
            }
            Command::Clear => {
                self.session.clear();
                vec![Notice::Info("Results cleared".to_string())]
            }
            Command::Reload => {
                self.session.reset();
                match self.host.list_messages().await {
                    Ok(messages) => vec![Notice::Info(format!(
                        "Chat reloaded ({} messages)",
                        messages.len()
                    ))],
                    Err(e) => vec![AppError::from(e).into()],
                }
            }
            Command::Help => vec![Notice::Block(HELP.to_string())],
            Command::Quit => Vec::new(),
        }
    }

    /// Read commands from stdin until `/quit` or end of input
    pub async fn run_interactive(&mut self) -> std::io::Result<()> {
        let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();

        println!("Type a search, or /help for commands.");
        loop {
            print!("[{}] > ", self.session.position_display());
            std::io::stdout().flush()?;

            let Some(line) = lines.next_line().await? else {
                break;
            };

            match parse_command(&line) {
                Ok(Command::Quit) => break,
                Ok(command) => {
                    for notice in self.execute(command).await {
                        println!("{}", notice);
                    }
                }
                Err(msg) => println!("{}", Notice::Warning(msg)),
            }
        }

        Ok(())
    }

    async fn find(&mut self, query: String) -> Vec<Notice> {
        self.session.set_query(query);
        match self.session.search(self.host.as_ref()).await {
            Ok(0) => vec![Notice::Info("No matches".to_string())],
            Ok(total) => {
                let mut notices = vec![Notice::Success(format!(
                    "Found {} matches in {} messages",
                    total,
                    self.session.results().len()
                ))];
                notices.extend(self.show());
                notices
            }
            Err(e) => vec![e.into()],
        }
    }

    fn show(&self) -> Vec<Notice> {
        match self
            .session
            .preview(self.display.highlight_format, self.display.preview_max_chars)
        {
            Some(preview) => vec![Notice::Block(format!(
                "[{}] {}",
                self.session.position_display(),
                preview
            ))],
            None => vec![Notice::Info("No results".to_string())],
        }
    }

    fn list(&self) -> Vec<Notice> {
        if self.session.results().is_empty() {
            return vec![Notice::Info("No results".to_string())];
        }

        let lines: Vec<String> = self
            .session
            .results()
            .iter()
            .enumerate()
            .map(|(i, doc)| {
                let marker = if self.session.current_index() == Some(i) { '>' } else { ' ' };
                let shape = match &doc.content {
                    MessageContent::Plain(_) => String::new(),
                    MessageContent::Parts(parts) => format!(", {} parts", parts.len()),
                };
                format!(
                    "{} {:>3}. {} #{} ({} matches{})",
                    marker,
                    i + 1,
                    doc.display_name,
                    doc.message_index,
                    doc.matches.len(),
                    shape
                )
            })
            .collect();
        vec![Notice::Block(lines.join("\n"))]
    }

    fn remember_replacement(&mut self, text: Option<String>) {
        if let Some(text) = text {
            self.replacement = text;
        }
    }
}

fn on_off(on: bool) -> &'static str {
    if on {
        "on"
    } else {
        "off"
    }
}
