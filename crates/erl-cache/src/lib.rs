//! ERL Cache Layer
//!
//! Memoizing decorator for any [`KnowledgeBase`](erl_domain::KnowledgeBase).
//!
//! # Architecture
//!
//! - Two caches per decorator: search results by query, texts by entity id
//! - Each cache is bounded by an approximate byte weight and evicts least
//!   recently used entries
//! - Misses are single-flight: concurrent callers for one key share a load
//! - Failures reach every waiter and are never cached
//! - Batch searches load every uncached query with one backend call
//!
//! # Examples
//!
//! ```
//! use erl_cache::{wrap, CacheConfig};
//! use erl_domain::{KnowledgeBase, LookupError, SearchHit};
//! use std::sync::Arc;
//!
//! struct Empty;
//!
//! impl KnowledgeBase for Empty {
//!     fn search(&self, _query: &str) -> Result<Vec<SearchHit>, LookupError> {
//!         Ok(Vec::new())
//!     }
//!
//!     fn text(&self, _id: &str) -> Result<Option<String>, LookupError> {
//!         Ok(None)
//!     }
//! }
//!
//! let kb = wrap(Arc::new(Empty), &CacheConfig::default());
//! assert!(kb.is_cached());
//!
//! // Already cached: returned as is
//! let again = wrap(kb.clone(), &CacheConfig::default());
//! assert!(Arc::ptr_eq(&kb, &again));
//! ```

#![warn(missing_docs)]

pub mod cached;
pub mod config;
pub mod loading;
pub mod weighted;

pub use cached::{wrap, CachedKnowledgeBase};
pub use config::{CacheConfig, ConfigError, DEFAULT_BUDGET_BYTES};
pub use loading::{CacheStats, LoadingCache, Weigher};
pub use weighted::{InsertOutcome, WeightedLru};
