//! Cache Store Module
//!
//! Bounded LRU store combining a HashMap index with the slab-backed recency list.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

use tracing::debug;

use crate::cache::{CacheStats, LruList};
use crate::error::{CacheError, Result};

// == LRU Store ==
/// Fixed-capacity key-value store with least-recently-used eviction.
///
/// Every `get` hit and every `put` promotes the entry to most recently used.
/// `len() <= capacity()` holds after every operation.
#[derive(Debug)]
pub struct LruStore<K, V> {
    /// Key to slot index in `list`
    index: HashMap<K, usize>,
    /// Entries in recency order
    list: LruList<K, V>,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of entries allowed
    capacity: usize,
}

impl<K, V> LruStore<K, V>
where
    K: Hash + Eq + Clone,
{
    // == Constructor ==
    /// Creates a new LruStore holding at most `capacity` entries.
    ///
    /// # Errors
    /// Returns `InvalidConfiguration` if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(CacheError::InvalidConfiguration(
                "capacity must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            index: HashMap::with_capacity(capacity),
            list: LruList::with_capacity(capacity),
            stats: CacheStats::new(),
            capacity,
        })
    }

    // == Get ==
    /// Retrieves a value by key and marks it most recently used.
    ///
    /// Returns None when the key is absent; a miss changes nothing but the
    /// miss counter.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.index.get(key).copied() {
            Some(idx) => {
                self.list.touch(idx);
                self.stats.record_hit();
                self.list.get(idx).map(|entry| &entry.value)
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Peek ==
    /// Reads a value without touching recency or statistics.
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = *self.index.get(key)?;
        self.list.get(idx).map(|entry| &entry.value)
    }

    /// Checks for a key without touching recency or statistics.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.contains_key(key)
    }

    // == Put ==
    /// Stores a key-value pair as most recently used.
    ///
    /// If the key already exists, the value is overwritten and nothing is
    /// evicted. If the store is full, the least recently used entry is evicted
    /// first and returned.
    pub fn put(&mut self, key: K, value: V) -> Option<(K, V)> {
        if let Some(&idx) = self.index.get(&key) {
            if let Some(entry) = self.list.get_mut(idx) {
                entry.value = value;
            }
            self.list.touch(idx);
            return None;
        }

        let evicted = if self.index.len() >= self.capacity {
            self.evict_oldest()
        } else {
            None
        };

        let idx = self.list.push_front(key.clone(), value);
        self.index.insert(key, idx);
        self.stats.set_total_entries(self.index.len());

        evicted
    }

    // == Remove ==
    /// Removes an entry by key, returning its value.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = self.index.remove(key)?;
        let entry = self.list.remove(idx)?;
        self.stats.set_total_entries(self.index.len());
        Some(entry.value)
    }

    // == Clear ==
    /// Removes every entry. Counters are kept.
    pub fn clear(&mut self) {
        self.index.clear();
        self.list.clear();
        self.stats.set_total_entries(0);
    }

    // == Eviction ==
    fn evict_oldest(&mut self) -> Option<(K, V)> {
        let entry = self.list.pop_back()?;
        self.index.remove(&entry.key);
        self.stats.record_eviction();
        debug!(
            "Evicted least recently used entry ({} evictions so far)",
            self.stats.evictions
        );
        Some((entry.key, entry.value))
    }

    /// Returns the entry that would be evicted next.
    pub fn peek_lru(&self) -> Option<(&K, &V)> {
        self.list.peek_back().map(|entry| (&entry.key, &entry.value))
    }

    /// Keys ordered from most to least recently used.
    pub fn keys_by_recency(&self) -> Vec<&K> {
        self.list.iter().map(|entry| &entry.key).collect()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.index.len());
        stats
    }

    pub(crate) fn record_load(&mut self) {
        self.stats.record_load();
    }

    pub(crate) fn record_load_failure(&mut self) {
        self.stats.record_load_failure();
    }

    // == Length ==
    /// Returns the current number of entries in the store.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Returns the fixed maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
