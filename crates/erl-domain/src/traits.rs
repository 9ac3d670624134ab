//! Trait definitions for external interactions
//!
//! These traits define the boundary between linking logic and knowledge-base
//! backends. The persistent entity store, remote API clients and the cache
//! decorator all implement the same capability.

use crate::{EntityType, LookupError};
use std::collections::{BTreeSet, HashMap};

/// A single candidate returned by a knowledge-base search
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchHit {
    /// Entity id
    pub id: String,

    /// Entity name as recorded in the knowledge base
    pub name: String,

    /// Entity type
    pub entity_type: EntityType,
}

impl SearchHit {
    /// Approximate heap footprint in bytes, used for cache weighing
    pub fn weight(&self) -> usize {
        self.id.len() + self.name.len()
    }
}

/// Lookup capability shared by every knowledge-base backend
///
/// Implemented by the infrastructure layer (erl-store, erl-cache, remote clients).
/// Implementations must be safe to call from many threads at once.
pub trait KnowledgeBase: Send + Sync {
    /// Query the knowledge base with a plain-text string, returning matching entities
    fn search(&self, query: &str) -> Result<Vec<SearchHit>, LookupError>;

    /// Run several searches as one batch, returning results keyed by query
    ///
    /// The default implementation issues one `search` per query.
    fn batch_search(
        &self,
        queries: &BTreeSet<String>,
    ) -> Result<HashMap<String, Vec<SearchHit>>, LookupError> {
        queries
            .iter()
            .map(|query| Ok((query.clone(), self.search(query)?)))
            .collect()
    }

    /// Retrieve the descriptive text for an entity id
    ///
    /// `Ok(None)` means the entity exists without text, or does not exist.
    fn text(&self, id: &str) -> Result<Option<String>, LookupError>;

    /// Whether this backend already caches its results
    ///
    /// Used by cache decorators to avoid wrapping themselves.
    fn is_cached(&self) -> bool {
        false
    }
}

impl<K: KnowledgeBase + ?Sized> KnowledgeBase for std::sync::Arc<K> {
    fn search(&self, query: &str) -> Result<Vec<SearchHit>, LookupError> {
        (**self).search(query)
    }

    fn batch_search(
        &self,
        queries: &BTreeSet<String>,
    ) -> Result<HashMap<String, Vec<SearchHit>>, LookupError> {
        (**self).batch_search(queries)
    }

    fn text(&self, id: &str) -> Result<Option<String>, LookupError> {
        (**self).text(id)
    }

    fn is_cached(&self) -> bool {
        (**self).is_cached()
    }
}
