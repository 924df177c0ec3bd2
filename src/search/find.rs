//! Pattern compilation and scanning
//!
//! Provides text search with support for:
//! - Plain text search (metacharacters escaped)
//! - Case-insensitive search
//! - Whole word matching
//! - Regular expressions with capture-group replacement

use crate::error::{SearchError, SearchResult};
use regex::{Regex, RegexBuilder};
use std::ops::Range;

/// Options for search operations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindOptions {
    /// Case-sensitive matching
    pub case_sensitive: bool,
    /// Match whole words only
    pub whole_word: bool,
    /// Use regular expressions
    pub use_regex: bool,
}

impl From<&crate::config::SearchConfig> for FindOptions {
    fn from(config: &crate::config::SearchConfig) -> Self {
        Self {
            case_sensitive: config.case_sensitive,
            whole_word: config.whole_word,
            use_regex: config.use_regex,
        }
    }
}

/// A single located occurrence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    /// Start byte offset in the searched text
    pub start: usize,
    /// End byte offset (exclusive)
    pub end: usize,
    /// Line number (0-indexed)
    pub line: usize,
    /// Column number in characters (0-indexed)
    pub column: usize,
    /// The matched text
    pub text: String,
}

impl Match {
    /// Get the range as a Rust Range
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// A compiled, globally scanning matcher
#[derive(Debug, Clone)]
pub struct Pattern {
    regex: Regex,
    query: String,
    options: FindOptions,
}

impl Pattern {
    /// Compile a query under the given options.
    ///
    /// Empty queries are rejected before anything is compiled.
    pub fn compile(query: &str, options: &FindOptions) -> SearchResult<Self> {
        if query.is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        let source = build_source(query, options);
        let regex = RegexBuilder::new(&source)
            .case_insensitive(!options.case_sensitive)
            .build()
            .map_err(|e| SearchError::InvalidPattern {
                pattern: query.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            regex,
            query: query.to_string(),
            options: options.clone(),
        })
    }

    /// The raw query this pattern was compiled from
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Find every non-overlapping match, left to right.
    ///
    /// Each search resumes at the end of the previous match. An empty match
    /// bumps the resume position one character forward so the scan always
    /// terminates.
    pub fn scan(&self, text: &str) -> Vec<Match> {
        let mut line_starts: Vec<usize> = vec![0];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }

        self.spans(text)
            .into_iter()
            .map(|range| {
                let line = line_starts
                    .partition_point(|&ls| ls <= range.start)
                    .saturating_sub(1);
                let line_start = line_starts.get(line).copied().unwrap_or(0);
                let column = text[line_start..range.start].chars().count();

                Match {
                    start: range.start,
                    end: range.end,
                    line,
                    column,
                    text: text[range].to_string(),
                }
            })
            .collect()
    }

    /// Replace every match found by [`Pattern::scan`].
    ///
    /// In regex mode the replacement may reference capture groups (`$1`,
    /// `${name}`, `$0`); otherwise it is inserted verbatim.
    pub fn replace_all(&self, text: &str, replacement: &str) -> String {
        let mut new_text = String::with_capacity(text.len());
        let mut last_end = 0;
        let mut pos = 0;

        while pos <= text.len() {
            let Some(caps) = self.regex.captures_at(text, pos) else {
                break;
            };
            let Some(whole) = caps.get(0) else {
                break;
            };

            new_text.push_str(&text[last_end..whole.start()]);
            if self.options.use_regex {
                caps.expand(replacement, &mut new_text);
            } else {
                new_text.push_str(replacement);
            }
            last_end = whole.end();
            pos = next_position(text, whole.start(), whole.end());
        }

        new_text.push_str(&text[last_end..]);
        new_text
    }

    fn spans(&self, text: &str) -> Vec<Range<usize>> {
        let mut spans = Vec::new();
        let mut pos = 0;

        while pos <= text.len() {
            let Some(found) = self.regex.find_at(text, pos) else {
                break;
            };
            spans.push(found.range());
            pos = next_position(text, found.start(), found.end());
        }

        spans
    }
}

/// Build the regex source for a query.
///
/// Literal queries are escaped first; whole-word boundaries are added after
/// escaping and wrap regex sources in a non-capturing group.
fn build_source(query: &str, options: &FindOptions) -> String {
    let source = if options.use_regex {
        query.to_string()
    } else {
        regex::escape(query)
    };

    if !options.whole_word {
        source
    } else if options.use_regex {
        format!(r"\b(?:{})\b", source)
    } else {
        format!(r"\b{}\b", source)
    }
}

/// Where the next search starts after a match at `start..end`
fn next_position(text: &str, start: usize, end: usize) -> usize {
    if start != end {
        return end;
    }
    // Empty match: step over one character (or past the end of the text)
    end + text[end..].chars().next().map_or(1, char::len_utf8)
}
