//! Configuration file
//!
//! ```json
//! {
//!   "index_prefix": "prod-",
//!   "indices": { "Order": "orders-v2" },
//!   "log_filter": "aerosearch=debug"
//! }
//! ```
//!
//! Every field is optional. Index names must satisfy the engine's rules:
//! lower-case, no whitespace, not empty.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::{Event, Logger};

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Read(#[from] std::io::Error),

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::Read(_) => "AERO_CONFIG_READ",
            ConfigError::Parse(_) => "AERO_CONFIG_PARSE",
            ConfigError::Invalid(_) => "AERO_CONFIG_INVALID",
        }
    }
}

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Prepended to every mapped index name
    #[serde(default)]
    pub index_prefix: String,

    /// Entity kind → index name, overriding registered names
    #[serde(default)]
    pub indices: BTreeMap<String, String>,

    /// `tracing` filter directive used by the binary
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            index_prefix: String::new(),
            indices: BTreeMap::new(),
            log_filter: default_log_filter(),
        }
    }
}

impl SearchConfig {
    /// Load and validate a configuration file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config = Self::from_json(&content)?;

        Logger::event(
            Event::ConfigLoaded,
            &[
                ("indices", config.indices.len().to_string().as_str()),
                ("path", path.display().to_string().as_str()),
            ],
        );
        Ok(config)
    }

    /// Parse and validate configuration text
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: SearchConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.index_prefix.chars().any(char::is_whitespace) {
            return Err(ConfigError::Invalid(format!(
                "index_prefix '{}' must not contain whitespace",
                self.index_prefix
            )));
        }
        if self.index_prefix.chars().any(char::is_uppercase) {
            return Err(ConfigError::Invalid(format!(
                "index_prefix '{}' must be lower-case",
                self.index_prefix
            )));
        }

        for (kind, index) in &self.indices {
            if index.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "index name for '{}' must not be empty",
                    kind
                )));
            }
            if index.chars().any(|c| c.is_whitespace() || c.is_uppercase()) {
                return Err(ConfigError::Invalid(format!(
                    "index name '{}' for '{}' must be lower-case without whitespace",
                    index, kind
                )));
            }
        }

        Ok(())
    }
}
