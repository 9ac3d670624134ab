//! Single-flight loading cache
//!
//! Concurrent requests for the same absent key share one load. The first
//! caller becomes the leader and runs the loader; everyone else waits on the
//! leader's flight and receives a clone of its result. Failed loads are
//! handed to every waiter but never stored.

use crate::weighted::WeightedLru;
use erl_domain::LookupError;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

/// Computes the approximate weight of an entry from its key and value
pub type Weigher<V> = fn(&str, &V) -> usize;

/// Point-in-time snapshot of cache counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// Requests served from the cache
    pub hits: u64,

    /// Requests that found no cached entry (leaders and waiters)
    pub misses: u64,

    /// Keys successfully loaded from the backend
    pub loads: u64,

    /// Keys whose load failed
    pub load_failures: u64,

    /// Entries evicted to stay within budget
    pub evictions: u64,

    /// Current retained weight
    pub weight: usize,

    /// Current retained entries
    pub entries: usize,
}

impl CacheStats {
    /// hits / (hits + misses), or 0 before any request
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug, Default)]
struct CacheMetrics {
    hits: AtomicU64,
    misses: AtomicU64,
    loads: AtomicU64,
    load_failures: AtomicU64,
    evictions: AtomicU64,
}

impl CacheMetrics {
    fn record(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }
}

/// One in-progress load that waiters can block on
struct Flight<V> {
    result: Mutex<Option<Result<V, LookupError>>>,
    done: Condvar,
}

impl<V: Clone> Flight<V> {
    fn new() -> Self {
        Self {
            result: Mutex::new(None),
            done: Condvar::new(),
        }
    }

    fn complete(&self, result: Result<V, LookupError>) {
        let mut slot = self.result.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            *slot = Some(result);
        }
        self.done.notify_all();
    }

    fn wait(&self) -> Result<V, LookupError> {
        let mut slot = self.result.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            if let Some(result) = slot.as_ref() {
                return result.clone();
            }
            slot = self.done.wait(slot).unwrap_or_else(PoisonError::into_inner);
        }
    }
}

struct State<V> {
    entries: WeightedLru<V>,
    in_flight: HashMap<String, Arc<Flight<V>>>,
}

enum Claim<V> {
    Hit(V),
    Lead(Arc<Flight<V>>),
    Wait(Arc<Flight<V>>),
}

/// Leadership of one key's flight
///
/// Dropping an unsettled lead (the loader panicked) fails the flight so
/// waiters are never stranded.
struct Lead<'a, V: Clone> {
    cache: &'a LoadingCache<V>,
    key: String,
    flight: Arc<Flight<V>>,
    settled: bool,
}

impl<V: Clone> Lead<'_, V> {
    fn settle(mut self, result: Result<V, LookupError>) -> Result<V, LookupError> {
        self.settled = true;
        self.cache.finish(&self.key, &self.flight, result)
    }
}

impl<V: Clone> Drop for Lead<'_, V> {
    fn drop(&mut self) {
        if !self.settled {
            let error = LookupError::Backend(format!("load of {:?} was abandoned", self.key));
            let _ = self.cache.finish(&self.key, &self.flight, Err(error));
        }
    }
}

/// Weight-bounded LRU cache with single-flight loading
pub struct LoadingCache<V> {
    name: &'static str,
    state: Mutex<State<V>>,
    weigher: Weigher<V>,
    metrics: CacheMetrics,
}

impl<V: Clone> LoadingCache<V> {
    /// Create a cache; `name` only labels log lines
    pub fn new(name: &'static str, budget: usize, weigher: Weigher<V>) -> Self {
        Self {
            name,
            state: Mutex::new(State {
                entries: WeightedLru::new(budget),
                in_flight: HashMap::new(),
            }),
            weigher,
            metrics: CacheMetrics::default(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State<V>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn claim(&self, key: &str) -> Claim<V> {
        let mut state = self.lock();
        if let Some(value) = state.entries.get(key) {
            CacheMetrics::record(&self.metrics.hits, 1);
            return Claim::Hit(value.clone());
        }
        CacheMetrics::record(&self.metrics.misses, 1);

        if let Some(flight) = state.in_flight.get(key) {
            return Claim::Wait(flight.clone());
        }
        let flight = Arc::new(Flight::new());
        state.in_flight.insert(key.to_string(), flight.clone());
        Claim::Lead(flight)
    }

    /// Publish a load result: store it on success, then release the waiters
    fn finish(
        &self,
        key: &str,
        flight: &Flight<V>,
        result: Result<V, LookupError>,
    ) -> Result<V, LookupError> {
        {
            let mut state = self.lock();
            state.in_flight.remove(key);
            match &result {
                Ok(value) => {
                    CacheMetrics::record(&self.metrics.loads, 1);
                    let weight = (self.weigher)(key, value);
                    let outcome = state.entries.insert(key.to_string(), value.clone(), weight);
                    if outcome.evicted > 0 {
                        CacheMetrics::record(&self.metrics.evictions, outcome.evicted as u64);
                        tracing::debug!("{} cache evicted {} entries", self.name, outcome.evicted);
                    }
                    if !outcome.retained {
                        tracing::debug!(
                            "{} cache entry {:?} weighs {} bytes, over the {} byte budget; not retained",
                            self.name,
                            key,
                            weight,
                            state.entries.budget()
                        );
                    }
                }
                Err(e) => {
                    CacheMetrics::record(&self.metrics.load_failures, 1);
                    tracing::debug!("{} cache load of {:?} failed: {}", self.name, key, e);
                }
            }
        }
        flight.complete(result.clone());
        result
    }

    /// Return the cached value for `key`, loading it at most once across threads
    pub fn get_or_load<F>(&self, key: &str, load: F) -> Result<V, LookupError>
    where
        F: FnOnce() -> Result<V, LookupError>,
    {
        match self.claim(key) {
            Claim::Hit(value) => Ok(value),
            Claim::Wait(flight) => flight.wait(),
            Claim::Lead(flight) => {
                let lead = Lead {
                    cache: self,
                    key: key.to_string(),
                    flight,
                    settled: false,
                };
                tracing::debug!("{} cache miss: {:?}", self.name, key);
                let result = load();
                lead.settle(result)
            }
        }
    }

    /// Return values for every key, loading all uncached keys in one call
    ///
    /// Keys already being loaded by another caller are waited on rather than
    /// loaded again. If any key fails, the first failure is returned; other
    /// keys loaded by the same call are still cached.
    pub fn get_or_load_many<F>(
        &self,
        keys: &BTreeSet<String>,
        load: F,
    ) -> Result<HashMap<String, V>, LookupError>
    where
        F: FnOnce(&BTreeSet<String>) -> Result<HashMap<String, V>, LookupError>,
    {
        let mut found = HashMap::with_capacity(keys.len());
        let mut leads = Vec::new();
        let mut waits = Vec::new();

        for key in keys {
            match self.claim(key) {
                Claim::Hit(value) => {
                    found.insert(key.clone(), value);
                }
                Claim::Lead(flight) => leads.push(Lead {
                    cache: self,
                    key: key.clone(),
                    flight,
                    settled: false,
                }),
                Claim::Wait(flight) => waits.push((key.clone(), flight)),
            }
        }

        let mut first_error = None;

        if !leads.is_empty() {
            let missing: BTreeSet<String> = leads.iter().map(|lead| lead.key.clone()).collect();
            tracing::debug!(
                "{} cache batch: {} cached, {} to load, {} in flight",
                self.name,
                found.len(),
                missing.len(),
                waits.len()
            );

            match load(&missing) {
                Ok(mut loaded) => {
                    for lead in leads {
                        let key = lead.key.clone();
                        let result = loaded.remove(&key).ok_or_else(|| {
                            LookupError::Backend(format!("batch result is missing {:?}", key))
                        });
                        match lead.settle(result) {
                            Ok(value) => {
                                found.insert(key, value);
                            }
                            Err(e) => {
                                first_error.get_or_insert(e);
                            }
                        }
                    }
                }
                Err(e) => {
                    for lead in leads {
                        let _ = lead.settle(Err(e.clone()));
                    }
                    first_error = Some(e);
                }
            }
        }

        for (key, flight) in waits {
            match flight.wait() {
                Ok(value) => {
                    found.insert(key, value);
                }
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(found),
        }
    }

    /// Snapshot of the counters
    pub fn stats(&self) -> CacheStats {
        let state = self.lock();
        CacheStats {
            hits: self.metrics.hits.load(Ordering::Relaxed),
            misses: self.metrics.misses.load(Ordering::Relaxed),
            loads: self.metrics.loads.load(Ordering::Relaxed),
            load_failures: self.metrics.load_failures.load(Ordering::Relaxed),
            evictions: self.metrics.evictions.load(Ordering::Relaxed),
            weight: state.entries.weight(),
            entries: state.entries.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Barrier;
    use std::time::Duration;

    fn string_weight(key: &str, value: &String) -> usize {
        key.len() + value.len()
    }

    #[test]
    fn test_hit_after_load() {
        let cache = LoadingCache::new("test", 100, string_weight);
        let calls = AtomicUsize::new(0);
        let load = || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok("value".to_string())
        };

        assert_eq!(cache.get_or_load("k", load).unwrap(), "value");
        assert_eq!(cache.get_or_load("k", load).unwrap(), "value");
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.loads, 1);
        assert_eq!(stats.weight, 6);
        assert_eq!(stats.hit_rate(), 0.5);
    }

    #[test]
    fn test_failure_not_cached() {
        let cache: LoadingCache<String> = LoadingCache::new("test", 100, string_weight);
        let err = cache.get_or_load("k", || Err(LookupError::Backend("down".to_string())));
        assert_eq!(err, Err(LookupError::Backend("down".to_string())));

        let ok = cache.get_or_load("k", || Ok("up".to_string()));
        assert_eq!(ok.unwrap(), "up");
        assert_eq!(cache.stats().load_failures, 1);
        assert_eq!(cache.stats().loads, 1);
    }

    #[test]
    fn test_concurrent_waiters_share_failure() {
        let cache: Arc<LoadingCache<String>> = Arc::new(LoadingCache::new("test", 100, string_weight));
        let calls = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                let calls = calls.clone();
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    cache.get_or_load("k", || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        std::thread::sleep(Duration::from_millis(100));
                        Err(LookupError::Backend("down".to_string()))
                    })
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap().is_err());
        }
        // A thread arriving after the failure was published may start a new flight
        assert!(calls.load(Ordering::SeqCst) >= 1);
        assert_eq!(cache.stats().entries, 0);
    }

    #[test]
    fn test_panicking_loader_releases_waiters() {
        let cache: Arc<LoadingCache<String>> = Arc::new(LoadingCache::new("test", 100, string_weight));

        let leader = {
            let cache = cache.clone();
            std::thread::spawn(move || {
                let _ = cache.get_or_load("k", || -> Result<String, LookupError> {
                    std::thread::sleep(Duration::from_millis(100));
                    panic!("loader exploded");
                });
            })
        };
        std::thread::sleep(Duration::from_millis(20));

        let result = cache.get_or_load("k", || Ok("fresh".to_string()));
        assert!(leader.join().is_err());
        // Either we waited on the doomed flight or started our own after it
        match result {
            Ok(value) => assert_eq!(value, "fresh"),
            Err(e) => assert!(matches!(e, LookupError::Backend(_))),
        }
    }

    #[test]
    fn test_batch_loads_only_missing() {
        let cache = LoadingCache::new("test", 1000, string_weight);
        cache.get_or_load("a", || Ok("A".to_string())).unwrap();

        let keys: BTreeSet<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        let mut requested = None;
        let values = cache
            .get_or_load_many(&keys, |missing| {
                requested = Some(missing.clone());
                Ok(missing.iter().map(|k| (k.clone(), k.to_uppercase())).collect())
            })
            .unwrap();

        let requested: Vec<String> = requested.unwrap().into_iter().collect();
        assert_eq!(requested, vec!["b", "c"]);
        assert_eq!(values.len(), 3);
        assert_eq!(values["c"], "C");
        assert_eq!(cache.stats().entries, 3);
    }

    #[test]
    fn test_batch_missing_key_is_error() {
        let cache: LoadingCache<String> = LoadingCache::new("test", 1000, string_weight);
        let keys: BTreeSet<String> = ["a", "b"].iter().map(|s| s.to_string()).collect();

        let result = cache.get_or_load_many(&keys, |_| {
            Ok(HashMap::from([("a".to_string(), "A".to_string())]))
        });
        assert!(matches!(result, Err(LookupError::Backend(_))));

        // The key that did arrive is kept
        assert_eq!(cache.stats().entries, 1);
    }
}
