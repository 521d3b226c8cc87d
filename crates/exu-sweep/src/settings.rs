//! Library settings governing save paths and experiment-name derivation.
//!
//! The original tooling read these from a process-global `config.json`; here
//! the settings are an explicit value constructed once and passed to the
//! call sites that need them.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use exu_core::errors::{ErrorInfo, ExuError};

/// Settings consumed by experiment descriptions and result stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Save-path template interpolated per permutation index.
    #[serde(default = "default_save_path")]
    pub save_path: String,
    /// Root directory holding experiment description files. Stripped from
    /// source paths when deriving experiment names.
    #[serde(default)]
    pub experiment_directory: Option<String>,
    /// Directory for log output.
    #[serde(default = "default_log_path")]
    pub log_path: String,
}

fn default_save_path() -> String {
    "results/{name}/{params}/{run}".to_string()
}

fn default_log_path() -> String {
    ".logs".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            save_path: default_save_path(),
            experiment_directory: None,
            log_path: default_log_path(),
        }
    }
}

impl Settings {
    /// Loads settings from a JSON document on disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ExuError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|err| {
            ExuError::Config(
                ErrorInfo::new("settings-read", "failed to read settings file")
                    .with_context("path", path.display().to_string())
                    .with_hint(err.to_string()),
            )
        })?;
        serde_json::from_str(&text).map_err(|err| {
            ExuError::Config(
                ErrorInfo::new("settings-parse", "failed to parse settings file")
                    .with_context("path", path.display().to_string())
                    .with_hint(err.to_string()),
            )
        })
    }
}
