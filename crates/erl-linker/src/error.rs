//! Error types for linking

use erl_domain::{DomainError, LookupError};
use thiserror::Error;

/// Errors that can occur while linking queries
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LinkError {
    /// The knowledge base could not be consulted
    #[error("Knowledge base lookup failed: {0}")]
    Lookup(#[from] LookupError),

    /// A link could not be constructed
    #[error("Invalid link: {0}")]
    Domain(#[from] DomainError),

    /// Every resolver in a chain declined the query
    #[error("No resolver produced a link for query {0}")]
    Unresolved(String),
}
