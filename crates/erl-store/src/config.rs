//! Configuration for building and opening entity stores
//!
//! Loaded from TOML; every field has a default so an empty file is valid.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Store configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// A field held an unusable value
    #[error("Invalid configuration field {field}: {reason}")]
    InvalidField {
        /// Field name
        field: &'static str,
        /// Why the value was rejected
        reason: String,
    },
}

/// What to do when the corpus contains the same entity id twice
///
/// Names are indexed separately from ids and the last entity ingested under
/// a name owns it, whatever the policy. An overwritten entity drops its old
/// name from the index, so an earlier entity that shared that name is no
/// longer reachable by name (it is still reachable by id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Later records replace earlier ones; replacements are counted in the build report
    #[default]
    Overwrite,

    /// The build fails with `StoreError::DuplicateEntity`
    Reject,
}

/// Configuration for [`EntityStore`](crate::EntityStore) builds
///
/// # Examples
///
/// ```
/// use erl_store::{DuplicatePolicy, StoreConfig};
///
/// let config = StoreConfig::from_toml_str(r#"
///     commit_interval = 500
///     duplicate_policy = "reject"
/// "#).unwrap();
/// assert_eq!(config.commit_interval, 500);
/// assert_eq!(config.report_interval, 10_000);
/// assert_eq!(config.duplicate_policy, DuplicatePolicy::Reject);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Records ingested between commits
    /// Default: 1000
    #[serde(default = "default_commit_interval")]
    pub commit_interval: usize,

    /// Records ingested between throughput log lines
    /// Default: 10000
    #[serde(default = "default_report_interval")]
    pub report_interval: usize,

    /// Handling of repeated entity ids
    /// Default: overwrite
    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,
}

fn default_commit_interval() -> usize {
    1000
}

fn default_report_interval() -> usize {
    10_000
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            commit_interval: default_commit_interval(),
            report_interval: default_report_interval(),
            duplicate_policy: DuplicatePolicy::default(),
        }
    }
}

impl StoreConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        let config: StoreConfig = toml::from_str(toml)?;
        config.validate()
    }

    /// Reject zero intervals
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.commit_interval == 0 {
            return Err(ConfigError::InvalidField {
                field: "commit_interval",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.report_interval == 0 {
            return Err(ConfigError::InvalidField {
                field: "report_interval",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(self)
    }
}
