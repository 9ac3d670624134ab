//! Error types shared across the workspace

use thiserror::Error;

/// Errors raised when a domain value violates its construction invariants
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// A required identifier was empty
    #[error("Empty {0}")]
    EmptyField(&'static str),

    /// Span bounds were inverted or empty
    #[error("Invalid span: begin {begin} must be less than end {end}")]
    InvalidSpan {
        /// Begin offset
        begin: usize,
        /// End offset
        end: usize,
    },

    /// Unrecognised entity type code
    #[error("Unknown entity type: {0}")]
    UnknownEntityType(String),
}

/// Uniform failure kind for every knowledge-base lookup backend
///
/// Persistent stores, remote clients and cache decorators all report their
/// failures through this type so that callers never depend on a concrete
/// backend.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LookupError {
    /// The backend has been closed and can no longer serve requests
    #[error("Knowledge base is closed")]
    Closed,

    /// The backend failed while serving the request
    #[error("Backend error: {0}")]
    Backend(String),
}
