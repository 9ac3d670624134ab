//! Cache budgets

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Default budget for each cache: 1 MiB
pub const DEFAULT_BUDGET_BYTES: usize = 1 << 20;

/// Cache configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// A budget was zero
    #[error("Invalid cache budget {field}: must be at least 1 byte")]
    ZeroBudget {
        /// Field name
        field: &'static str,
    },
}

/// Weight budgets for the search and text caches
///
/// ```
/// use erl_cache::CacheConfig;
///
/// let config = CacheConfig::from_toml_str("text_budget_bytes = 4096").unwrap();
/// assert_eq!(config.search_budget_bytes, 1 << 20);
/// assert_eq!(config.text_budget_bytes, 4096);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Approximate byte budget for search results
    /// Default: 1 MiB
    #[serde(default = "default_budget")]
    pub search_budget_bytes: usize,

    /// Approximate byte budget for entity texts
    /// Default: 1 MiB
    #[serde(default = "default_budget")]
    pub text_budget_bytes: usize,
}

fn default_budget() -> usize {
    DEFAULT_BUDGET_BYTES
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            search_budget_bytes: DEFAULT_BUDGET_BYTES,
            text_budget_bytes: DEFAULT_BUDGET_BYTES,
        }
    }
}

impl CacheConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        let config: CacheConfig = toml::from_str(toml)?;
        config.validate()
    }

    /// Reject zero budgets
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.search_budget_bytes == 0 {
            return Err(ConfigError::ZeroBudget {
                field: "search_budget_bytes",
            });
        }
        if self.text_budget_bytes == 0 {
            return Err(ConfigError::ZeroBudget {
                field: "text_budget_bytes",
            });
        }
        Ok(self)
    }
}
