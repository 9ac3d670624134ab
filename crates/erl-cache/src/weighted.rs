//! Weight-bounded LRU map
//!
//! Entries carry a caller-supplied weight. Once the running total would
//! exceed the budget, the least recently used entries are evicted.

use linked_hash_map::LinkedHashMap;

/// Result of an insert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InsertOutcome {
    /// Entries evicted to make room
    pub evicted: usize,

    /// Whether the new entry was kept; false when it alone exceeds the budget
    pub retained: bool,
}

/// LRU map bounded by total entry weight
#[derive(Debug)]
pub struct WeightedLru<V> {
    entries: LinkedHashMap<String, (V, usize)>,
    weight: usize,
    budget: usize,
}

impl<V> WeightedLru<V> {
    /// Create an empty map with the given weight budget
    pub fn new(budget: usize) -> Self {
        Self {
            entries: LinkedHashMap::new(),
            weight: 0,
            budget,
        }
    }

    /// Look up a key, marking it most recently used
    pub fn get(&mut self, key: &str) -> Option<&V> {
        self.entries.get_refresh(key).map(|(value, _)| &*value)
    }

    /// Whether the key is present, without touching recency
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert or replace an entry, evicting least recently used entries as needed
    pub fn insert(&mut self, key: String, value: V, weight: usize) -> InsertOutcome {
        if let Some((_, old_weight)) = self.entries.remove(&key) {
            self.weight -= old_weight;
        }

        if weight > self.budget {
            return InsertOutcome {
                evicted: 0,
                retained: false,
            };
        }

        let mut evicted = 0;
        while self.weight + weight > self.budget {
            match self.entries.pop_front() {
                Some((_, (_, old_weight))) => {
                    self.weight -= old_weight;
                    evicted += 1;
                }
                None => break,
            }
        }

        self.entries.insert(key, (value, weight));
        self.weight += weight;
        InsertOutcome {
            evicted,
            retained: true,
        }
    }

    /// Total weight of retained entries
    pub fn weight(&self) -> usize {
        self.weight
    }

    /// Configured budget
    pub fn budget(&self) -> usize {
        self.budget
    }

    /// Number of retained entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is retained
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
