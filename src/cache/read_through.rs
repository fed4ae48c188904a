//! Read-Through Cache Module
//!
//! Wraps an [`LruStore`] and populates it from a [`Loader`] on every miss.

use std::hash::Hash;

use tracing::{debug, info, warn};

use crate::cache::{CacheStats, LruStore};
use crate::error::{CacheError, Result};

// == Loader ==
/// Backing source consulted on a cache miss.
///
/// A loader that has nothing for a key may return a placeholder value; that
/// value is cached like any other. Returning `Err` leaves the cache untouched.
pub trait Loader<K, V> {
    fn load(&self, key: &K) -> Result<V>;
}

/// Plain functions and closures are infallible loaders.
impl<K, V, F> Loader<K, V> for F
where
    F: Fn(&K) -> V,
{
    fn load(&self, key: &K) -> Result<V> {
        Ok(self(key))
    }
}

// == Read-Through Cache ==
/// Synchronous read-through cache: check the store, load on miss, store, return.
///
/// Use `&F` as the loader type to borrow a loader instead of owning it.
#[derive(Debug)]
pub struct ReadThroughCache<K, V, L> {
    store: LruStore<K, V>,
    loader: L,
}

impl<K, V, L> ReadThroughCache<K, V, L>
where
    K: Hash + Eq + Clone,
    V: Clone,
    L: Loader<K, V>,
{
    // == Constructor ==
    /// Creates a cache holding at most `capacity` entries.
    ///
    /// # Errors
    /// Returns `InvalidConfiguration` if `capacity` is zero.
    pub fn new(capacity: usize, loader: L) -> Result<Self> {
        Ok(Self::with_store(LruStore::new(capacity)?, loader))
    }

    /// Creates a cache around an existing store.
    pub fn with_store(store: LruStore<K, V>, loader: L) -> Self {
        Self { store, loader }
    }

    // == Get ==
    /// Returns the cached value for `key`, loading and caching it on a miss.
    ///
    /// With an infallible loader this never fails.
    ///
    /// # Errors
    /// Returns `LoadFailed` if the loader fails; the store is left unchanged.
    pub fn get(&mut self, key: &K) -> Result<V> {
        if let Some(value) = self.store.get(key) {
            debug!("Cache hit");
            return Ok(value.clone());
        }

        debug!("Cache miss, invoking loader");
        let value = self.load(key)?;
        self.store.put(key.clone(), value.clone());
        Ok(value)
    }

    // == Refresh ==
    /// Loads `key` unconditionally and overwrites the cached value.
    ///
    /// On failure the previous entry, if any, stays in place.
    pub fn refresh(&mut self, key: &K) -> Result<V> {
        let value = self.load(key)?;
        self.store.put(key.clone(), value.clone());
        info!("Refreshed cache entry");
        Ok(value)
    }

    // == Invalidate ==
    /// Drops the cached value for `key` so the next `get` reloads it.
    pub fn invalidate(&mut self, key: &K) -> Option<V> {
        self.store.remove(key)
    }

    /// Drops every cached value.
    pub fn clear(&mut self) {
        self.store.clear();
    }

    fn load(&mut self, key: &K) -> Result<V> {
        match self.loader.load(key) {
            Ok(value) => {
                self.store.record_load();
                Ok(value)
            }
            Err(err) => {
                self.store.record_load_failure();
                warn!("Loader failed: {}", err);
                Err(into_load_failure(err))
            }
        }
    }

    // == Accessors ==
    pub fn store(&self) -> &LruStore<K, V> {
        &self.store
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn stats(&self) -> CacheStats {
        self.store.stats()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.store.capacity()
    }
}

/// Normalizes any loader error to `LoadFailed`.
pub(crate) fn into_load_failure(err: CacheError) -> CacheError {
    match err {
        CacheError::LoadFailed(_) => err,
        other => CacheError::LoadFailed(other.to_string()),
    }
}
