// File: src/config.rs
// Purpose: Configuration parsing from unobtrusive.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Validation configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub validation: ValidationConfig,

    #[serde(default)]
    pub remote: RemoteConfig,
}

/// Per-form settings handed to every validator
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationConfig {
    /// Skip hidden fields (default: true)
    #[serde(default = "default_true")]
    pub ignore_hidden: bool,

    /// Class added to invalid inputs
    #[serde(default = "default_error_class")]
    pub error_class: String,

    /// Class added to inputs that passed
    #[serde(default = "default_valid_class")]
    pub valid_class: String,
}

/// Remote rule settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoteConfig {
    /// Base for relative remote URLs (e.g., "http://localhost:9001")
    #[serde(default)]
    pub base_url: Option<String>,

    /// Request timeout; unset leaves it to the HTTP stack
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Message shown when the remote call itself fails
    #[serde(default = "default_failure_message")]
    pub failure_message: String,
}

// Default values
fn default_true() -> bool {
    true
}

fn default_error_class() -> String {
    "input-validation-error".to_string()
}

fn default_valid_class() -> String {
    "input-validation-valid".to_string()
}

fn default_failure_message() -> String {
    "This field is invalid.".to_string()
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            ignore_hidden: true,
            error_class: default_error_class(),
            valid_class: default_valid_class(),
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: None,
            failure_message: default_failure_message(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file; missing or empty files give defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        Ok(config)
    }

    /// Load configuration from default path (./unobtrusive.toml)
    pub fn load_default() -> Result<Self> {
        Self::load("unobtrusive.toml")
    }
}
