//! Error types for the entity store

use crate::ConfigError;
use erl_domain::LookupError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store was closed; queries are no longer served
    #[error("Entity store is closed")]
    Closed,

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// File system error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A corpus record could not be parsed
    #[error("Malformed corpus record in {file} at byte {position}: {message}")]
    Corpus {
        /// Corpus file being parsed
        file: PathBuf,
        /// Byte offset of the reader when the problem was found
        position: u64,
        /// Description of the problem
        message: String,
    },

    /// An entity id appeared twice while duplicates are rejected
    #[error("Duplicate entity id: {0}")]
    DuplicateEntity(String),

    /// The database holds no completed build
    #[error("Store at {0} was never completely built")]
    IncompleteBuild(PathBuf),

    /// The database already holds a completed build
    #[error("Store at {0} is already built")]
    AlreadyBuilt(PathBuf),

    /// Stored entity body could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The build configuration was rejected
    #[error("Invalid store configuration: {0}")]
    Config(#[from] ConfigError),

    /// Stored data violated an invariant
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl From<StoreError> for LookupError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Closed => LookupError::Closed,
            other => LookupError::Backend(other.to_string()),
        }
    }
}
