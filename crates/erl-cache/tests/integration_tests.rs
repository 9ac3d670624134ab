//! Integration tests for erl-cache
//!
//! A counting backend records every call that reaches it, so each test can
//! assert exactly how much work the cache let through.

use erl_cache::{wrap, CacheConfig, CachedKnowledgeBase};
use erl_domain::{Entity, EntityType, KnowledgeBase, LookupError, SearchHit};
use erl_store::{EntityStore, StoreConfig};
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::time::Duration;

#[derive(Default)]
struct CountingBackend {
    searches: AtomicUsize,
    texts: AtomicUsize,
    batches: Mutex<Vec<BTreeSet<String>>>,
    delay: Duration,
}

impl CountingBackend {
    fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    fn hits_for(query: &str) -> Result<Vec<SearchHit>, LookupError> {
        if query.starts_with("fail") {
            return Err(LookupError::Backend(format!("cannot search {}", query)));
        }
        Ok(vec![SearchHit {
            id: format!("id:{}", query),
            name: query.to_string(),
            entity_type: EntityType::Unknown,
        }])
    }

    fn search_calls(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }

    fn text_calls(&self) -> usize {
        self.texts.load(Ordering::SeqCst)
    }
}

impl KnowledgeBase for CountingBackend {
    fn search(&self, query: &str) -> Result<Vec<SearchHit>, LookupError> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(self.delay);
        Self::hits_for(query)
    }

    fn batch_search(
        &self,
        queries: &BTreeSet<String>,
    ) -> Result<HashMap<String, Vec<SearchHit>>, LookupError> {
        self.batches.lock().unwrap().push(queries.clone());
        queries
            .iter()
            .map(|query| Ok((query.clone(), Self::hits_for(query)?)))
            .collect()
    }

    fn text(&self, id: &str) -> Result<Option<String>, LookupError> {
        self.texts.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(self.delay);
        if id == "missing" {
            Ok(None)
        } else {
            Ok(Some(format!("text of {}", id)))
        }
    }
}

#[test]
fn test_repeated_search_hits_cache() {
    let kb = CachedKnowledgeBase::new(CountingBackend::default(), &CacheConfig::default());

    let first = kb.search("Paris").unwrap();
    let second = kb.search("Paris").unwrap();
    assert_eq!(first, second);
    assert_eq!(kb.inner().search_calls(), 1);

    let stats = kb.search_stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.loads, 1);
}

#[test]
fn test_text_cached_including_absent() {
    let kb = CachedKnowledgeBase::new(CountingBackend::default(), &CacheConfig::default());

    assert_eq!(kb.text("E1").unwrap().as_deref(), Some("text of E1"));
    assert_eq!(kb.text("E1").unwrap().as_deref(), Some("text of E1"));
    assert_eq!(kb.text("missing").unwrap(), None);
    assert_eq!(kb.text("missing").unwrap(), None);
    assert_eq!(kb.inner().text_calls(), 2);
    assert_eq!(kb.text_stats().entries, 2);

    // Search and text caches are independent
    assert_eq!(kb.search_stats().entries, 0);
}

#[test]
fn test_concurrent_misses_load_once() {
    let kb = Arc::new(CachedKnowledgeBase::new(
        CountingBackend::slow(Duration::from_millis(200)),
        &CacheConfig::default(),
    ));
    let barrier = Arc::new(Barrier::new(50));

    let handles: Vec<_> = (0..50)
        .map(|_| {
            let kb = kb.clone();
            let barrier = barrier.clone();
            std::thread::spawn(move || {
                barrier.wait();
                kb.search("Paris").unwrap()
            })
        })
        .collect();

    let results: Vec<Vec<SearchHit>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(kb.inner().search_calls(), 1);
    assert!(results.iter().all(|hits| hits == &results[0]));
    assert_eq!(results[0][0].id, "id:Paris");
}

#[test]
fn test_concurrent_text_misses_load_once() {
    let kb = Arc::new(CachedKnowledgeBase::new(
        CountingBackend::slow(Duration::from_millis(200)),
        &CacheConfig::default(),
    ));
    let barrier = Arc::new(Barrier::new(20));

    let handles: Vec<_> = (0..20)
        .map(|_| {
            let kb = kb.clone();
            let barrier = barrier.clone();
            std::thread::spawn(move || {
                barrier.wait();
                kb.text("E7").unwrap()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap().as_deref(), Some("text of E7"));
    }
    assert_eq!(kb.inner().text_calls(), 1);
}

#[test]
fn test_failures_are_not_cached() {
    let kb = CachedKnowledgeBase::new(CountingBackend::default(), &CacheConfig::default());

    assert!(matches!(kb.search("fail-1"), Err(LookupError::Backend(_))));
    assert!(matches!(kb.search("fail-1"), Err(LookupError::Backend(_))));
    assert_eq!(kb.inner().search_calls(), 2);

    let stats = kb.search_stats();
    assert_eq!(stats.load_failures, 2);
    assert_eq!(stats.entries, 0);
}

#[test]
fn test_eviction_by_weight() {
    // Each single-letter query weighs 2 * (1 + 4 + 1) = 12 bytes
    let config = CacheConfig {
        search_budget_bytes: 30,
        ..CacheConfig::default()
    };
    let kb = CachedKnowledgeBase::new(CountingBackend::default(), &config);

    kb.search("a").unwrap();
    kb.search("b").unwrap();
    kb.search("c").unwrap();
    assert_eq!(kb.search_stats().evictions, 1);
    assert_eq!(kb.search_stats().weight, 24);

    // "a" was evicted and must be reloaded; that evicts "b"
    kb.search("a").unwrap();
    assert_eq!(kb.inner().search_calls(), 4);

    kb.search("c").unwrap();
    assert_eq!(kb.inner().search_calls(), 4);
    assert_eq!(kb.search_stats().evictions, 2);
}

#[test]
fn test_oversized_entry_returned_but_not_retained() {
    let config = CacheConfig {
        search_budget_bytes: 10,
        ..CacheConfig::default()
    };
    let kb = CachedKnowledgeBase::new(CountingBackend::default(), &config);

    assert_eq!(kb.search("a").unwrap()[0].id, "id:a");
    assert_eq!(kb.search("a").unwrap()[0].id, "id:a");
    assert_eq!(kb.inner().search_calls(), 2);
    assert_eq!(kb.search_stats().entries, 0);
}

#[test]
fn test_batch_search_merges_cached_and_loaded() {
    let kb = CachedKnowledgeBase::new(CountingBackend::default(), &CacheConfig::default());
    kb.search("a").unwrap();

    let queries: BTreeSet<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
    let results = kb.batch_search(&queries).unwrap();

    assert_eq!(results.len(), 3);
    assert_eq!(results["a"][0].id, "id:a");
    assert_eq!(results["c"][0].id, "id:c");

    let batches = kb.inner().batches.lock().unwrap().clone();
    assert_eq!(batches.len(), 1);
    assert_eq!(
        batches[0].iter().cloned().collect::<Vec<_>>(),
        vec!["b".to_string(), "c".to_string()]
    );

    // Everything is cached now; a second batch never reaches the backend
    kb.batch_search(&queries).unwrap();
    assert_eq!(kb.inner().batches.lock().unwrap().len(), 1);
    assert_eq!(kb.inner().search_calls(), 1);
}

#[test]
fn test_batch_failure_propagates() {
    let kb = CachedKnowledgeBase::new(CountingBackend::default(), &CacheConfig::default());
    let queries: BTreeSet<String> = ["a", "fail-x"].iter().map(|s| s.to_string()).collect();

    assert!(matches!(kb.batch_search(&queries), Err(LookupError::Backend(_))));
    assert_eq!(kb.search_stats().entries, 0);
}

#[test]
fn test_wrap_is_idempotent() {
    let backend: Arc<dyn KnowledgeBase> = Arc::new(CountingBackend::default());
    assert!(!backend.is_cached());

    let cached = wrap(backend, &CacheConfig::default());
    assert!(cached.is_cached());

    let rewrapped = wrap(cached.clone(), &CacheConfig::default());
    assert!(Arc::ptr_eq(&cached, &rewrapped));
}

#[test]
fn test_cache_over_entity_store() {
    let entities = vec![
        Ok(Entity::builder("E1", "Paris", EntityType::GeoPolitical)
            .text("Capital of France.")
            .build()
            .unwrap()),
        Ok(Entity::builder("E2", "Berlin", EntityType::GeoPolitical).build().unwrap()),
    ];
    let (store, _) =
        EntityStore::build_from_entities(":memory:", entities, &StoreConfig::default()).unwrap();
    let kb = CachedKnowledgeBase::new(store, &CacheConfig::default());

    assert_eq!(kb.search("Paris").unwrap()[0].id, "E1");
    assert!(kb.search("Pariss").unwrap().is_empty());
    assert_eq!(kb.text("E1").unwrap().as_deref(), Some("Capital of France."));

    // Cached answers survive the backend closing
    kb.inner().close().unwrap();
    assert_eq!(kb.search("Paris").unwrap()[0].id, "E1");
    assert_eq!(kb.search("Berlin"), Err(LookupError::Closed));
}
