use serde::Deserialize;
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::indexing::MachineConfig;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Configuration for a client session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the search server API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Client-side timeout for one `/status` request
    #[serde(default = "default_status_timeout_ms")]
    pub status_timeout_ms: u64,

    /// Delay before the next poll after a successful one
    #[serde(default = "default_poll_interval_ms")]
    pub success_interval_ms: u64,

    /// Delay before the next poll after a failed one
    #[serde(default = "default_poll_interval_ms")]
    pub failure_interval_ms: u64,

    /// Flat-counter window after which an indexing run counts as finished
    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,

    /// Consecutive failed polls tolerated before alerting
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    /// Timeout for search and listing requests
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Connector kinds offered to the user
    #[serde(default = "default_visible_source_types")]
    pub visible_source_types: Vec<String>,

    /// Where durable client flags are kept. In-memory when unset.
    #[serde(default)]
    pub storage_path: Option<PathBuf>,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_status_timeout_ms() -> u64 {
    3_000
}

fn default_poll_interval_ms() -> u64 {
    1_000
}

fn default_idle_timeout_ms() -> u64 {
    10_000
}

fn default_failure_threshold() -> u32 {
    5
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_visible_source_types() -> Vec<String> {
    vec!["google_drive".to_string(), "slack".to_string()]
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            status_timeout_ms: default_status_timeout_ms(),
            success_interval_ms: default_poll_interval_ms(),
            failure_interval_ms: default_poll_interval_ms(),
            idle_timeout_ms: default_idle_timeout_ms(),
            failure_threshold: default_failure_threshold(),
            request_timeout_ms: default_request_timeout_ms(),
            visible_source_types: default_visible_source_types(),
            storage_path: None,
        }
    }
}

impl ClientConfig {
    /// Load and validate a TOML configuration file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: ClientConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("base_url must not be empty".to_string()));
        }
        if self.status_timeout_ms == 0 {
            return Err(ConfigError::Invalid("status_timeout_ms must be > 0".to_string()));
        }
        if self.success_interval_ms == 0 || self.failure_interval_ms == 0 {
            return Err(ConfigError::Invalid("poll intervals must be > 0".to_string()));
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid("request_timeout_ms must be > 0".to_string()));
        }
        if self.failure_threshold == 0 {
            return Err(ConfigError::Invalid("failure_threshold must be >= 1".to_string()));
        }
        Ok(())
    }

    pub fn status_timeout(&self) -> Duration {
        Duration::from_millis(self.status_timeout_ms)
    }

    pub fn success_interval(&self) -> Duration {
        Duration::from_millis(self.success_interval_ms)
    }

    pub fn failure_interval(&self) -> Duration {
        Duration::from_millis(self.failure_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn machine_config(&self) -> MachineConfig {
        MachineConfig {
            idle_timeout: Duration::from_millis(self.idle_timeout_ms),
            failure_threshold: self.failure_threshold,
        }
    }
}
