//! Search module for Chat Search Replace
//!
//! Handles search functionality including:
//! - Literal and regular expression matching over chat history
//! - Highlighted previews of matched messages
//! - Replacing matches in one message or across the whole result set

mod find;
mod highlight;
mod replace;

pub use find::FindOptions;
pub use highlight::HighlightFormat;

use find::{Match, Pattern};
use highlight::{clip_preview, highlight};
use replace::{rewrite_all, rewrite_message, ReplaceSummary};

use crate::chat::{MessageContent, RawMessage};
use crate::error::{AppResult, HostError, SearchError};
use crate::host::ChatHost;

/// Navigation direction through a result set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Prev,
}

/// Step a cursor through `count` results, wrapping at both ends.
///
/// Returns `None` when there is nothing to select. Without a current
/// selection, `Next` lands on the first result and `Prev` on the last.
pub fn advance(direction: Direction, current: Option<usize>, count: usize) -> Option<usize> {
    if count == 0 {
        return None;
    }

    let next = match (direction, current) {
        (Direction::Next, Some(i)) => (i + 1) % count,
        (Direction::Next, None) => 0,
        (Direction::Prev, Some(i)) if i > 0 && i < count => i - 1,
        (Direction::Prev, _) => count - 1,
    };
    Some(next)
}

/// One matched message
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Position of the message in the chat at search time
    pub message_index: usize,
    /// Speaker tag
    pub role: String,
    /// Name shown in result headers
    pub display_name: String,
    /// Structural shape of the content at search time
    pub content: MessageContent,
    /// Combined text the matches refer to
    pub text: String,
    /// Non-overlapping matches, ordered by start
    pub matches: Vec<Match>,
}

impl Document {
    /// Build a document from a message, or `None` if it has no text or no match
    pub fn extract(message: &RawMessage, index: usize, pattern: &Pattern) -> Option<Self> {
        let content = message.content_shape()?;
        let text = content.combined_text();
        if text.is_empty() {
            return None;
        }

        let matches = pattern.scan(&text);
        if matches.is_empty() {
            return None;
        }

        Some(Self {
            message_index: index,
            role: message.role.clone(),
            display_name: message.display_name().to_string(),
            content,
            text,
            matches,
        })
    }
}

/// The one active search: its pattern, results, and cursor
#[derive(Debug, Clone, Default)]
pub struct SearchSession {
    /// Current search query
    pub query: String,
    /// Search options
    pub options: FindOptions,
    /// Pattern the current results were found with
    pattern: Option<Pattern>,
    /// Current search results
    results: Vec<Document>,
    /// Current result index (0-indexed)
    current_index: Option<usize>,
}

impl SearchSession {
    /// Create a new search session
    pub fn new(options: FindOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    /// Set the search query
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    /// Toggle case sensitivity
    pub fn toggle_case_sensitive(&mut self) -> bool {
        self.options.case_sensitive = !self.options.case_sensitive;
        self.clear();
        self.options.case_sensitive
    }

    /// Toggle whole word matching
    pub fn toggle_whole_word(&mut self) -> bool {
        self.options.whole_word = !self.options.whole_word;
        self.clear();
        self.options.whole_word
    }

    /// Toggle regex mode
    pub fn toggle_regex(&mut self) -> bool {
        self.options.use_regex = !self.options.use_regex;
        self.clear();
        self.options.use_regex
    }

    /// Run the current query against the host's chat history.
    ///
    /// On any error the previous results are left untouched. Returns the
    /// total number of matches.
    pub async fn search<H: ChatHost + ?Sized>(&mut self, host: &H) -> AppResult<usize> {
        let pattern = Pattern::compile(&self.query, &self.options)?;

        let messages = host.list_messages().await.map_err(|e| match e {
            HostError::SourceUnavailable(_) => e,
            other => HostError::SourceUnavailable(other.to_string()),
        })?;

        let results: Vec<Document> = messages
            .iter()
            .enumerate()
            .filter_map(|(index, message)| Document::extract(message, index, &pattern))
            .collect();

        log::debug!(
            "Search '{}' (regex={}, case={}, word={}) matched {} of {} messages",
            pattern.query(),
            self.options.use_regex,
            self.options.case_sensitive,
            self.options.whole_word,
            results.len(),
            messages.len()
        );

        self.pattern = Some(pattern);
        self.update_results(results);
        Ok(self.total_matches())
    }

    /// Replace every match in the selected message.
    ///
    /// The message is re-read from the host first. On success the entry is
    /// dropped from the results and the cursor clamped; returns the message
    /// index that was rewritten.
    pub async fn replace_current<H: ChatHost + ?Sized>(
        &mut self,
        host: &mut H,
        replacement: &str,
    ) -> AppResult<usize> {
        let (Some(pattern), Some(current)) = (&self.pattern, self.current_index) else {
            return Err(SearchError::NoActiveResult.into());
        };
        let Some(document) = self.results.get(current) else {
            return Err(SearchError::NoActiveResult.into());
        };
        let index = document.message_index;

        rewrite_message(host, index, pattern, replacement).await?;
        if let Err(e) = host.notify_content_changed().await {
            log::warn!("Refresh after replacing message #{} failed: {}", index, e);
        }

        self.remove_current();
        log::info!("Replaced matches in message #{}", index);
        Ok(index)
    }

    /// Replace every match in every result, then clear the now stale results
    pub async fn replace_all<H: ChatHost + ?Sized>(
        &mut self,
        host: &mut H,
        replacement: &str,
    ) -> AppResult<ReplaceSummary> {
        let Some(pattern) = &self.pattern else {
            return Ok(ReplaceSummary::default());
        };
        if self.results.is_empty() {
            return Ok(ReplaceSummary::default());
        }

        let summary = rewrite_all(host, &self.results, pattern, replacement).await;
        if let Err(e) = host.notify_content_changed().await {
            log::warn!("Refresh after replace all failed: {}", e);
        }

        self.clear();
        Ok(summary)
    }

    /// Update search results
    fn update_results(&mut self, results: Vec<Document>) {
        self.results = results;
        self.current_index = if self.results.is_empty() { None } else { Some(0) };
    }

    /// Drop the selected result and keep the cursor in bounds
    fn remove_current(&mut self) {
        let Some(current) = self.current_index else {
            return;
        };
        if current < self.results.len() {
            self.results.remove(current);
        }
        self.current_index = match self.results.len() {
            0 => None,
            len => Some(current.min(len - 1)),
        };
    }

    /// Move the cursor
    pub fn navigate(&mut self, direction: Direction) -> Option<&Document> {
        self.current_index = advance(direction, self.current_index, self.results.len());
        self.current_result()
    }

    /// Move to next result
    pub fn next_result(&mut self) -> Option<&Document> {
        self.navigate(Direction::Next)
    }

    /// Move to previous result
    pub fn prev_result(&mut self) -> Option<&Document> {
        self.navigate(Direction::Prev)
    }

    /// Get current result
    pub fn current_result(&self) -> Option<&Document> {
        self.current_index.and_then(|i| self.results.get(i))
    }

    /// Current cursor position
    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    /// All results of the last search
    pub fn results(&self) -> &[Document] {
        &self.results
    }

    /// Total matches across all results
    pub fn total_matches(&self) -> usize {
        self.results.iter().map(|d| d.matches.len()).sum()
    }

    /// Get result position display string (e.g., "3 / 15")
    pub fn position_display(&self) -> String {
        let current = self.current_index.map(|i| i + 1).unwrap_or(0);
        format!("{} / {}", current, self.results.len())
    }

    /// Header and highlighted text of the selected result
    pub fn preview(&self, format: HighlightFormat, max_chars: usize) -> Option<String> {
        let document = self.current_result()?;
        let (text, matches) = clip_preview(&document.text, &document.matches, max_chars);
        let speaker = if document.display_name == document.role {
            document.display_name.clone()
        } else {
            format!("{} ({})", document.display_name, document.role)
        };
        Some(format!(
            "{} #{}\n{}",
            speaker,
            document.message_index,
            highlight(&text, &matches, format)
        ))
    }

    /// Drop results and cursor, keeping query and options
    pub fn clear(&mut self) {
        self.pattern = None;
        self.results.clear();
        self.current_index = None;
    }

    /// Return to a blank session (new conversation)
    pub fn reset(&mut self) {
        self.clear();
        self.query.clear();
    }
}
