//! Chat Search Replace - search and rewrite chat message history
//!
//! Entry point for the application. Handles CLI argument parsing,
//! logging initialization, and console bootstrap.

mod chat;
mod config;
mod console;
mod error;
mod host;
mod search;

use anyhow::Context;
use config::Config;
use console::{Command, Console};
use host::{ChatFileHost, ChatHost, MemoryHost};
use search::FindOptions;
use std::path::PathBuf;

/// Application name for logging
const APP_NAME: &str = "chat-search-replace";

/// Options gathered from the command line
#[derive(Debug, Clone, Default, PartialEq)]
struct Flags {
    /// Chat file to open
    chat_file: Option<PathBuf>,
    /// Alternative configuration file
    config_file: Option<PathBuf>,
    /// Work on an in-memory copy; never write the chat file
    dry_run: bool,
    /// Force regex mode on
    regex: bool,
    /// Force case-sensitive matching on
    case_sensitive: bool,
    /// Force whole-word matching on
    whole_word: bool,
    /// One-shot search query
    find: Option<String>,
    /// One-shot replacement (requires `find`)
    replace: Option<String>,
}

/// What the command line asked for
#[derive(Debug, Clone, PartialEq)]
enum CliAction {
    Run(Flags),
    InitConfig,
    Help,
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    init_logging();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let flags = match parse_args(&args) {
        Ok(CliAction::Run(flags)) => flags,
        Ok(CliAction::Help) => {
            print_help();
            return Ok(());
        }
        Ok(CliAction::Version) => {
            print_version();
            return Ok(());
        }
        Ok(CliAction::InitConfig) => return init_config(),
        Err(msg) => {
            eprintln!("Error: {}", msg);
            eprintln!("Use --help for usage information");
            std::process::exit(1);
        }
    };

    log::info!("Starting {}", APP_NAME);
    run(flags).await
}

/// Initialize the logging system
fn init_logging() {
    // Set default log level if not specified
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info,chat_search_replace=debug");
    }

    env_logger::Builder::from_default_env()
        .format_timestamp_millis()
        .init();
}

/// Write the current (or default) configuration to the default location
fn init_config() -> anyhow::Result<()> {
    let config = Config::load().context("loading configuration")?;
    config.save().context("saving configuration")?;
    let dir = Config::config_dir()?;
    println!("Configuration written to {}", dir.join(config::CONFIG_FILE_NAME).display());
    Ok(())
}

async fn run(flags: Flags) -> anyhow::Result<()> {
    let config = match &flags.config_file {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("loading configuration")?;

    let chat_file = flags
        .chat_file
        .clone()
        .context("no chat file given")?;

    let file_host = ChatFileHost::open(&chat_file, &config.files)
        .await
        .with_context(|| format!("opening {}", chat_file.display()))?;

    let host: Box<dyn ChatHost> = if flags.dry_run {
        log::info!("Dry run: changes stay in memory");
        Box::new(MemoryHost::new(file_host.list_messages().await?))
    } else {
        Box::new(file_host)
    };

    let mut options = FindOptions::from(&config.search);
    options.use_regex |= flags.regex;
    options.case_sensitive |= flags.case_sensitive;
    options.whole_word |= flags.whole_word;

    let mut console = Console::new(host, options, config.display.clone());

    match flags.find {
        Some(query) => run_one_shot(&mut console, query, flags.replace).await,
        None => Ok(console.run_interactive().await?),
    }
}

/// Search once, list the results and optionally replace them all.
///
/// Fails if any step reported an error, so scripts see a non-zero exit.
async fn run_one_shot(
    console: &mut Console,
    query: String,
    replacement: Option<String>,
) -> anyhow::Result<()> {
    let mut commands = vec![Command::Find(query), Command::List];
    if let Some(replacement) = replacement {
        commands.push(Command::ReplaceAll(Some(replacement)));
    }

    let mut errors = 0;
    for command in commands {
        for notice in console.execute(command).await {
            if notice.is_error() {
                errors += 1;
            }
            println!("{}", notice);
        }
    }

    if errors > 0 {
        anyhow::bail!("finished with {} error(s)", errors);
    }
    Ok(())
}

/// Parse command line arguments (program name already stripped)
fn parse_args(args: &[String]) -> Result<CliAction, String> {
    let mut flags = Flags::default();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => return Ok(CliAction::Help),
            "-v" | "--version" => return Ok(CliAction::Version),
            "--init-config" => return Ok(CliAction::InitConfig),
            "-n" | "--dry-run" => flags.dry_run = true,
            "-r" | "--regex" => flags.regex = true,
            "-c" | "--case-sensitive" => flags.case_sensitive = true,
            "-w" | "--whole-word" => flags.whole_word = true,
            opt @ ("-f" | "--find" | "-R" | "--replace" | "--config") => {
                let value = args
                    .get(i + 1)
                    .ok_or_else(|| format!("{} requires an argument", opt))?
                    .clone();
                match opt {
                    "-f" | "--find" => flags.find = Some(value),
                    "-R" | "--replace" => flags.replace = Some(value),
                    _ => flags.config_file = Some(PathBuf::from(value)),
                }
                i += 1;
            }
            arg if arg.starts_with('-') => {
                return Err(format!("Unknown option: {}", arg));
            }
            path => {
                if flags.chat_file.is_some() {
                    return Err(format!("Unexpected argument: {}", path));
                }
                flags.chat_file = Some(PathBuf::from(path));
            }
        }
        i += 1;
    }

    if flags.chat_file.is_none() {
        return Err("missing chat file".to_string());
    }
    if flags.replace.is_some() && flags.find.is_none() {
        return Err("--replace requires --find".to_string());
    }

    Ok(CliAction::Run(flags))
}

/// Print help message
fn print_help() {
    println!(
        r#"Chat Search Replace - search and rewrite chat history

USAGE:
    chat-search-replace [OPTIONS] <CHAT_FILE>

OPTIONS:
    -h, --help              Show this help message
    -v, --version           Show version information
    -f, --find <TEXT>       Search once, print results and exit
    -R, --replace <TEXT>    With --find: replace every match, then exit
    -r, --regex             Treat search text as a regular expression
    -c, --case-sensitive    Match case exactly
    -w, --whole-word        Match whole words only
    -n, --dry-run           Never write the chat file
        --config <FILE>     Use an alternative configuration file
        --init-config       Write the configuration file with defaults and exit

Without --find an interactive console starts; type /help there.

EXAMPLES:
    chat-search-replace chat.json
    chat-search-replace -f "colour" -R "color" chat.json
    chat-search-replace -r -f '(\w+)@example\.com' -R '$1@example.org' chat.json
"#
    );
}

/// Print version information
fn print_version() {
    println!("{} {}", APP_NAME, env!("CARGO_PKG_VERSION"));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_one_shot() {
        let action = parse_args(&args(&["-r", "-f", "a+", "--replace", "b", "chat.json"])).unwrap();
        let CliAction::Run(flags) = action else {
            panic!("expected run");
        };
        assert!(flags.regex);
        assert_eq!(flags.find.as_deref(), Some("a+"));
        assert_eq!(flags.replace.as_deref(), Some("b"));
        assert_eq!(flags.chat_file, Some(PathBuf::from("chat.json")));
    }

    #[test]
    fn test_parse_help_and_version() {
        assert_eq!(parse_args(&args(&["--help"])), Ok(CliAction::Help));
        assert_eq!(parse_args(&args(&["-v"])), Ok(CliAction::Version));
        assert_eq!(parse_args(&args(&["--init-config"])), Ok(CliAction::InitConfig));
    }

    fn one_shot_console(messages: Vec<chat::RawMessage>, options: FindOptions) -> Console {
        let host = MemoryHost::new(messages);
        Console::new(Box::new(host), options, config::DisplayConfig::default())
    }

    #[tokio::test]
    async fn test_one_shot_succeeds() {
        let mut console = one_shot_console(
            vec![chat::RawMessage::plain("user", "colour")],
            FindOptions::default(),
        );
        let result = run_one_shot(&mut console, "colour".to_string(), Some("color".to_string())).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_one_shot_fails_on_invalid_pattern() {
        let options = FindOptions {
            use_regex: true,
            ..Default::default()
        };
        let mut console = one_shot_console(vec![chat::RawMessage::plain("user", "x")], options);
        let result = run_one_shot(&mut console, "(x".to_string(), None).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_args(&args(&[])).is_err());
        assert!(parse_args(&args(&["--find"])).is_err());
        assert!(parse_args(&args(&["-R", "x", "chat.json"])).is_err());
        assert!(parse_args(&args(&["--bogus", "chat.json"])).is_err());
        assert!(parse_args(&args(&["a.json", "b.json"])).is_err());
    }
}
