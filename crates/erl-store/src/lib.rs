//! ERL Storage Layer
//!
//! Persistent index of canonical knowledge-base entities, built once from an
//! XML corpus and reopened read-only afterwards.
//!
//! # Architecture
//!
//! - Streaming XML reader (quick-xml) for `kb_part-<n>.xml` corpus files
//! - SQLite for the id → entity and exact name → id indexes
//! - Entity bodies stored as JSON so facts survive round trips intact
//! - A `build_complete` marker distinguishes finished builds from aborted ones
//!
//! # Examples
//!
//! ```no_run
//! use erl_domain::KnowledgeBase;
//! use erl_store::{EntityStore, StoreConfig};
//!
//! let (store, _report) = EntityStore::build("kb.db", "data/kb", &StoreConfig::default()).unwrap();
//! let hits = store.search("Paris").unwrap();
//! assert!(hits.len() <= 1);
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod corpus;
pub mod error;
pub mod store;

pub use config::{ConfigError, DuplicatePolicy, StoreConfig};
pub use corpus::{corpus_files, CorpusReader};
pub use error::StoreError;
pub use store::{BuildReport, EntityIter, EntityStore};
