//! Error types for Chat Search Replace
//!
//! This module defines all custom error types used throughout the application.
//! Error types are organized by category so each triggering action (search,
//! replace one, replace all) can report failures without corrupting state.

use std::path::PathBuf;
use thiserror::Error;

/// Main application error type encompassing all error categories
#[derive(Error, Debug)]
pub enum AppError {
    /// Search and pattern errors
    #[error(transparent)]
    Search(#[from] SearchError),

    /// Host (chat history) errors
    #[error(transparent)]
    Host(#[from] HostError),

    /// Configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors raised while building or applying a search
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// No search text supplied
    #[error("Search text is empty")]
    EmptyQuery,

    /// Regex mode with unparsable syntax
    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// An operation needed a selected result but none exists
    #[error("No search result is selected")]
    NoActiveResult,
}

/// Errors raised by the chat history host
#[derive(Error, Debug)]
pub enum HostError {
    /// Listing or reading messages failed
    #[error("Chat history unavailable: {0}")]
    SourceUnavailable(String),

    /// A message index no longer exists
    #[error("Message #{index} not found")]
    MessageNotFound { index: usize },

    /// Writing a message back failed
    #[error("Could not update message #{index}: {reason}")]
    PersistenceFailure { index: usize, reason: String },

    /// Chat file could not be read or written
    #[error("Chat file error: {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Chat file is not valid chat JSON
    #[error("Invalid chat file {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    /// Chat file exceeds the configured size limit
    #[error("Chat file too large: {path} ({size} bytes, max {max_size} bytes)")]
    TooLarge {
        path: PathBuf,
        size: u64,
        max_size: u64,
    },
}

/// Configuration related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Error loading configuration file
    #[error("Could not load configuration: {0}")]
    LoadError(String),

    /// Error saving configuration
    #[error("Could not save configuration: {0}")]
    SaveError(String),

    /// Error parsing configuration
    #[error("Invalid configuration format: {0}")]
    ParseError(String),

    /// Configuration directory error
    #[error("Could not access configuration directory")]
    DirectoryError,
}

/// Result type alias for operations that can fail with AppError
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for search operations
pub type SearchResult<T> = Result<T, SearchError>;

/// Result type alias for host operations
pub type HostResult<T> = Result<T, HostError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

impl SearchError {
    /// Create a user-friendly message suitable for a transient notification
    pub fn user_message(&self) -> String {
        match self {
            SearchError::EmptyQuery => "Enter something to search for.".to_string(),
            SearchError::InvalidPattern { reason, .. } => {
                format!("Regular expression error: {}", reason)
            }
            SearchError::NoActiveResult => "Nothing selected. Run a search first.".to_string(),
        }
    }

    /// Whether this is a warning rather than a real failure
    pub fn is_warning(&self) -> bool {
        matches!(self, SearchError::EmptyQuery | SearchError::NoActiveResult)
    }
}

impl HostError {
    /// Create a user-friendly message suitable for a transient notification
    pub fn user_message(&self) -> String {
        match self {
            HostError::SourceUnavailable(_) => {
                "Could not read the chat history. Try reloading the chat.".to_string()
            }
            HostError::MessageNotFound { index } => {
                format!("Message #{} no longer exists.", index)
            }
            HostError::TooLarge { max_size, .. } => {
                format!(
                    "This chat file is too large to open. Maximum size is {} bytes.",
                    max_size
                )
            }
            _ => self.to_string(),
        }
    }
}

impl AppError {
    /// Create a user-friendly message for any error category
    pub fn user_message(&self) -> String {
        match self {
            AppError::Search(e) => e.user_message(),
            AppError::Host(e) => e.user_message(),
            AppError::Config(e) => e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_pattern_display() {
        let err = SearchError::InvalidPattern {
            pattern: "(abc".to_string(),
            reason: "unclosed group".to_string(),
        };
        assert!(err.to_string().contains("(abc"));
        assert!(err.user_message().contains("unclosed group"));
    }

    #[test]
    fn test_empty_query_is_warning() {
        assert!(SearchError::EmptyQuery.is_warning());
        assert!(!SearchError::InvalidPattern {
            pattern: String::new(),
            reason: String::new(),
        }
        .is_warning());
    }

    #[test]
    fn test_host_error_user_message() {
        let err = HostError::MessageNotFound { index: 7 };
        assert!(err.user_message().contains("#7"));
    }

    #[test]
    fn test_app_error_from_search_error() {
        let app_err: AppError = SearchError::EmptyQuery.into();
        assert!(matches!(app_err, AppError::Search(_)));
    }
}
