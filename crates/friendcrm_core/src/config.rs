//! Runtime configuration.
//!
//! # Responsibility
//! - Load storage and logging settings from an optional JSON file.
//! - Apply environment overrides on top of file values.
//!
//! # Invariants
//! - A missing config file is not an error; defaults apply.
//! - Unknown JSON keys are ignored; the file is shared with other FriendCRM
//!   clients (`serverAddress` and friends).

use crate::logging::default_log_level;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DATA_DIR_ENV: &str = "FRIENDCRM_DATA_DIR";
pub const LOG_LEVEL_ENV: &str = "FRIENDCRM_LOG_LEVEL";
const DEFAULT_DATA_DIR: &str = "./data";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config `{}`: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config `{}`: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    /// Root of the filesystem store; records live in `<data_dir>/friends`.
    #[serde(alias = "combinedDataPath")]
    pub data_dir: PathBuf,
    pub log_level: String,
    /// File logging is skipped when unset.
    pub log_dir: Option<PathBuf>,
    /// Output format for command results: `json`, or anything else for text.
    pub default_format: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            log_level: default_log_level().to_string(),
            log_dir: None,
            default_format: None,
        }
    }
}

impl AppConfig {
    /// Reads `path` if it exists, then applies process environment overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::from_file(path)?;
        Ok(config.with_overrides(|key| std::env::var(key).ok()))
    }

    /// Reads `path`, falling back to defaults when the file is missing.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Whether command results should be rendered as JSON.
    pub fn prefers_json(&self) -> bool {
        self.default_format
            .as_deref()
            .is_some_and(|format| format.trim().eq_ignore_ascii_case("json"))
    }

    /// Applies overrides from `lookup`; blank values are ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        if let Some(data_dir) = lookup(DATA_DIR_ENV) {
            self.data_dir = PathBuf::from(data_dir);
        }
        if let Some(level) = lookup(LOG_LEVEL_ENV) {
            self.log_level = level;
        }
        self
    }
}
