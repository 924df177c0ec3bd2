//! Configuration management for Chat Search Replace
//!
//! Handles loading, saving, and managing application configuration.
//! Configuration is persisted as JSON in the platform configuration directory.

use crate::error::{ConfigError, ConfigResult};
use crate::search::HighlightFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application identifier following reverse-DNS convention
pub const APP_ID: &str = "io.github.ChatSearchReplace";

/// Configuration file name inside the configuration directory
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Maximum chat file size to open (in bytes) - 64MB
pub const MAX_FILE_SIZE: u64 = 64 * 1024 * 1024;

/// Default preview length in characters
pub const DEFAULT_PREVIEW_MAX_CHARS: usize = 600;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Search defaults
    pub search: SearchConfig,

    /// Result display configuration
    pub display: DisplayConfig,

    /// Chat file handling configuration
    pub files: FileConfig,
}

impl Config {
    /// Load configuration from the default location or return defaults
    pub fn load() -> ConfigResult<Self> {
        let path = Self::config_dir()?.join(CONFIG_FILE_NAME);
        Self::load_from(&path)
    }

    /// Load configuration from a specific file; a missing file yields defaults
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            log::debug!("No configuration at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::LoadError(format!("{}: {}", path.display(), e)))?;

        serde_json::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save configuration to the default location
    pub fn save(&self) -> ConfigResult<()> {
        let path = Self::config_dir()?.join(CONFIG_FILE_NAME);
        self.save_to(&path)
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::SaveError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SaveError(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| ConfigError::SaveError(e.to_string()))
    }

    /// Get the configuration directory path
    pub fn config_dir() -> ConfigResult<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join(APP_ID))
            .ok_or(ConfigError::DirectoryError)
    }
}

/// Default search options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Case-sensitive matching
    pub case_sensitive: bool,

    /// Interpret queries as regular expressions
    pub use_regex: bool,

    /// Match whole words only
    pub whole_word: bool,
}

/// Result display configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// How highlighted previews are rendered
    pub highlight_format: HighlightFormat,

    /// Truncate previews to this many characters (0 disables truncation)
    pub preview_max_chars: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            highlight_format: HighlightFormat::Terminal,
            preview_max_chars: DEFAULT_PREVIEW_MAX_CHARS,
        }
    }
}

/// Chat file handling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Copy the chat file aside before the first write
    pub create_backups: bool,

    /// Maximum chat file size to open (in bytes)
    pub max_file_size: u64,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            create_backups: true,
            max_file_size: MAX_FILE_SIZE,
        }
    }
}
