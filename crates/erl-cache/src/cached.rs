//! Caching decorator for knowledge-base backends

use crate::loading::{CacheStats, LoadingCache};
use crate::CacheConfig;
use erl_domain::{KnowledgeBase, LookupError, SearchHit};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Weight of a search entry: two bytes per unit of key and hit length
#[allow(clippy::ptr_arg)]
fn search_weight(query: &str, hits: &Vec<SearchHit>) -> usize {
    2 * (query.len() + hits.iter().map(SearchHit::weight).sum::<usize>())
}

/// Weight of a text entry: two bytes per unit of id and text length
fn text_weight(id: &str, text: &Option<String>) -> usize {
    2 * (id.len() + text.as_ref().map_or(0, String::len))
}

/// A [`KnowledgeBase`] that memoizes another one
///
/// Searches and texts are cached separately, each within its own weight
/// budget. Concurrent misses on the same key reach the backend once.
///
/// # Examples
///
/// ```no_run
/// use erl_cache::{CacheConfig, CachedKnowledgeBase};
/// use erl_domain::KnowledgeBase;
/// use erl_store::EntityStore;
///
/// let store = EntityStore::open("kb.db").unwrap();
/// let kb = CachedKnowledgeBase::new(store, &CacheConfig::default());
/// kb.search("Paris").unwrap();
/// kb.search("Paris").unwrap();
/// assert_eq!(kb.search_stats().hits, 1);
/// ```
pub struct CachedKnowledgeBase<K> {
    inner: K,
    searches: LoadingCache<Vec<SearchHit>>,
    texts: LoadingCache<Option<String>>,
}

impl<K: KnowledgeBase> CachedKnowledgeBase<K> {
    /// Wrap `inner` with fresh, empty caches
    ///
    /// This always adds a layer, even over a backend that already caches
    /// (a warning is logged). Use [`wrap`] to skip already cached backends.
    pub fn new(inner: K, config: &CacheConfig) -> Self {
        if inner.is_cached() {
            tracing::warn!("Stacking a cache over a backend that is already cached");
        }
        tracing::debug!(
            "Creating knowledge base cache (search budget {} bytes, text budget {} bytes)",
            config.search_budget_bytes,
            config.text_budget_bytes
        );
        Self {
            inner,
            searches: LoadingCache::new("search", config.search_budget_bytes, search_weight),
            texts: LoadingCache::new("text", config.text_budget_bytes, text_weight),
        }
    }

    /// The wrapped backend
    pub fn inner(&self) -> &K {
        &self.inner
    }

    /// Counters for the search cache
    pub fn search_stats(&self) -> CacheStats {
        self.searches.stats()
    }

    /// Counters for the text cache
    pub fn text_stats(&self) -> CacheStats {
        self.texts.stats()
    }
}

impl<K: KnowledgeBase> KnowledgeBase for CachedKnowledgeBase<K> {
    fn search(&self, query: &str) -> Result<Vec<SearchHit>, LookupError> {
        self.searches.get_or_load(query, || self.inner.search(query))
    }

    fn batch_search(
        &self,
        queries: &BTreeSet<String>,
    ) -> Result<HashMap<String, Vec<SearchHit>>, LookupError> {
        self.searches
            .get_or_load_many(queries, |missing| self.inner.batch_search(missing))
    }

    fn text(&self, id: &str) -> Result<Option<String>, LookupError> {
        self.texts.get_or_load(id, || self.inner.text(id))
    }

    fn is_cached(&self) -> bool {
        true
    }
}

/// Add a cache in front of `kb`, unless it already has one
///
/// Wrapping a cached backend again is a no-op: a warning is logged and `kb`
/// is returned unchanged.
pub fn wrap(kb: Arc<dyn KnowledgeBase>, config: &CacheConfig) -> Arc<dyn KnowledgeBase> {
    if kb.is_cached() {
        tracing::warn!("Knowledge base is already cached; not wrapping it again");
        return kb;
    }
    Arc::new(CachedKnowledgeBase::new(kb, config))
}
