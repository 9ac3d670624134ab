//! Placeholder allocation for unmatched queries

use crate::{LinkError, Linker, Resolver};
use erl_domain::{EntityType, Link, Query, NIL_PREFIX};
use std::sync::atomic::{AtomicU64, Ordering};

/// Links every query to a fresh `NIL<n>` placeholder
///
/// Each instance owns its counter, starting at 1, so independent linkers
/// produce independent, reproducible sequences. Allocation is atomic: under
/// concurrent use every call still receives a distinct id.
///
/// # Examples
///
/// ```
/// use erl_domain::Query;
/// use erl_linker::{Linker, NilLinker};
///
/// let linker = NilLinker::new();
/// let query = Query::new("EL1", "Pariss", "APW_ENG_20080502.0001").unwrap();
/// assert_eq!(linker.link(&query).unwrap().entity_id(), "NIL1");
/// assert_eq!(linker.link(&query).unwrap().entity_id(), "NIL2");
/// ```
#[derive(Debug)]
pub struct NilLinker {
    next: AtomicU64,
}

impl NilLinker {
    /// Create a linker whose first placeholder is `NIL1`
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Number of placeholders handed out so far
    pub fn allocated(&self) -> u64 {
        self.next.load(Ordering::Relaxed) - 1
    }

    fn next_id(&self) -> String {
        format!("{}{}", NIL_PREFIX, self.next.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for NilLinker {
    fn default() -> Self {
        Self::new()
    }
}

impl Linker for NilLinker {
    fn link(&self, query: &Query) -> Result<Link, LinkError> {
        let id = self.next_id();
        tracing::trace!("Assigned {} to query {}", id, query.id());
        Ok(Link::for_query(query, id, EntityType::Unknown, false)?)
    }
}

impl Resolver for NilLinker {
    fn resolve(&self, query: &Query) -> Result<Option<Link>, LinkError> {
        self.link(query).map(Some)
    }

    fn name(&self) -> &str {
        "nil"
    }
}
