//! ERL Domain Layer
//!
//! This crate contains the shared data model for entity resolution and linking.
//! Every other crate in the workspace depends on it, so it stays small: value
//! types, their construction invariants, and the capability trait that all
//! knowledge-base backends implement.
//!
//! ## Key Concepts
//!
//! - **Entity**: A canonical knowledge-base record (id, name, type, text, facts)
//! - **Query**: A single mention awaiting resolution
//! - **Link**: The resolution decision produced for one query
//! - **Genre**: Coarse source category derived from a document id
//! - **KnowledgeBase**: The lookup capability ("search by query", "text by id")
//!
//! ## Architecture
//!
//! - Pure data and invariants only
//! - Storage, caching and linking live in other crates
//! - Backends are composed by wrapping, never by subclassing

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod entity;
pub mod error;
pub mod genre;
pub mod link;
pub mod query;
pub mod traits;

// Re-exports for convenience
pub use entity::{Entity, EntityBuilder, EntityType, Fact, FactFragment};
pub use error::{DomainError, LookupError};
pub use genre::Genre;
pub use link::Link;
pub use query::{Query, Span};
pub use traits::{KnowledgeBase, SearchHit};

/// Prefix shared by every synthetic placeholder id
pub const NIL_PREFIX: &str = "NIL";

/// Collapse any NIL placeholder id down to the bare `NIL` token
///
/// Non-NIL ids are returned unchanged.
///
/// # Examples
///
/// ```
/// use erl_domain::normalize_nil;
///
/// assert_eq!(normalize_nil("NIL0042"), "NIL");
/// assert_eq!(normalize_nil("E0001"), "E0001");
/// ```
pub fn normalize_nil(id: &str) -> &str {
    if id.starts_with(NIL_PREFIX) {
        NIL_PREFIX
    } else {
        id
    }
}
