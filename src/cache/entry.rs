//! Cache Entry Module
//!
//! Defines the structure for individual cache entries and their recency links.

// == Cache Entry ==
/// Represents a single cache entry with its key, value and position in the
/// recency list.
///
/// `prev` points towards the most recently used end, `next` towards the
/// least recently used end. Both are slot indices owned by [`super::LruList`].
#[derive(Debug, Clone)]
pub struct CacheEntry<K, V> {
    /// The key this entry is stored under
    pub key: K,
    /// The stored value
    pub value: V,
    pub(crate) prev: Option<usize>,
    pub(crate) next: Option<usize>,
}

impl<K, V> CacheEntry<K, V> {
    // == Constructor ==
    /// Creates a detached entry.
    pub fn new(key: K, value: V) -> Self {
        Self {
            key,
            value,
            prev: None,
            next: None,
        }
    }

    /// Returns true if the entry is not linked to any neighbour.
    pub fn is_detached(&self) -> bool {
        self.prev.is_none() && self.next.is_none()
    }
}
