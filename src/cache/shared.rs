//! Shared Cache Module
//!
//! Thread-safe read-through cache for async callers. A single mutex guards the
//! store and concurrent misses on the same key share one loader call.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex as SlotMutex;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, warn};

use crate::cache::read_through::into_load_failure;
use crate::cache::{CacheStats, LruStore};
use crate::error::Result;

// == Async Loader ==
/// Async counterpart of [`super::Loader`]: one logical call per miss,
/// returning a value or placeholder, or an error that leaves the store untouched.
#[async_trait]
pub trait AsyncLoader<K, V>: Send + Sync {
    async fn load(&self, key: &K) -> Result<V>;
}

/// Loads in progress, keyed by the key being loaded.
type InFlight<K, V> = HashMap<K, Arc<OnceCell<V>>>;

// == In-Flight Slot ==
/// Removes the in-flight slot for `key` when the load that owns it ends,
/// whether it succeeded, failed or was cancelled.
struct InFlightSlot<'a, K: Hash + Eq, V> {
    in_flight: &'a SlotMutex<InFlight<K, V>>,
    key: &'a K,
    cell: &'a Arc<OnceCell<V>>,
}

impl<K: Hash + Eq, V> Drop for InFlightSlot<'_, K, V> {
    fn drop(&mut self) {
        let mut in_flight = self.in_flight.lock();
        if in_flight
            .get(self.key)
            .is_some_and(|current| Arc::ptr_eq(current, self.cell))
        {
            in_flight.remove(self.key);
        }
    }
}

// == Shared Cache ==
/// Cloneable handle to a read-through cache shared between tasks.
///
/// The store lock is never held across a loader call, and the in-flight
/// map lock is never held across an await.
pub struct SharedCache<K, V, L> {
    store: Arc<Mutex<LruStore<K, V>>>,
    in_flight: Arc<SlotMutex<InFlight<K, V>>>,
    loader: Arc<L>,
}

impl<K, V, L> Clone for SharedCache<K, V, L> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            in_flight: Arc::clone(&self.in_flight),
            loader: Arc::clone(&self.loader),
        }
    }
}

impl<K, V, L> SharedCache<K, V, L>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    L: AsyncLoader<K, V>,
{
    // == Constructor ==
    /// Creates a shared cache holding at most `capacity` entries.
    ///
    /// # Errors
    /// Returns `InvalidConfiguration` if `capacity` is zero.
    pub fn new(capacity: usize, loader: L) -> Result<Self> {
        Self::with_loader(capacity, Arc::new(loader))
    }

    /// Creates a shared cache using a loader that is also held elsewhere.
    pub fn with_loader(capacity: usize, loader: Arc<L>) -> Result<Self> {
        Ok(Self {
            store: Arc::new(Mutex::new(LruStore::new(capacity)?)),
            in_flight: Arc::new(SlotMutex::new(HashMap::new())),
            loader,
        })
    }

    // == Get ==
    /// Returns the cached value for `key`, loading it on a miss.
    ///
    /// Concurrent misses for the same key wait on the first caller's load.
    /// If that load fails or its caller is cancelled, a waiting caller runs
    /// its own attempt.
    ///
    /// # Errors
    /// Returns `LoadFailed` if the loader fails; the store is left unchanged.
    pub async fn get(&self, key: &K) -> Result<V> {
        {
            let mut store = self.store.lock().await;
            if let Some(value) = store.get(key) {
                debug!("Cache hit");
                return Ok(value.clone());
            }
        }

        let cell = self.join_in_flight(key);
        match cell
            .get_or_try_init(|| self.load_and_store(key, &cell))
            .await
        {
            Ok(value) => Ok(value.clone()),
            Err(err) => Err(into_load_failure(err)),
        }
    }

    /// Returns the pending load for `key`, registering a new one if none is pending.
    fn join_in_flight(&self, key: &K) -> Arc<OnceCell<V>> {
        let mut in_flight = self.in_flight.lock();
        if let Some(cell) = in_flight.get(key) {
            // A filled cell belongs to a finished load; the store has the answer.
            if !cell.initialized() {
                return Arc::clone(cell);
            }
        }

        let cell = Arc::new(OnceCell::new());
        in_flight.insert(key.clone(), Arc::clone(&cell));
        cell
    }

    /// Runs the loader and stores its value before the cell is filled.
    async fn load_and_store(&self, key: &K, cell: &Arc<OnceCell<V>>) -> Result<V> {
        let _slot = InFlightSlot {
            in_flight: &self.in_flight,
            key,
            cell,
        };

        // A load may have finished between the store miss and joining.
        let cached = self.store.lock().await.peek(key).cloned();
        if let Some(value) = cached {
            debug!("Value stored by a concurrent load");
            return Ok(value);
        }

        debug!("Cache miss, invoking loader");
        match self.loader.load(key).await {
            Ok(value) => {
                let mut store = self.store.lock().await;
                store.record_load();
                store.put(key.clone(), value.clone());
                Ok(value)
            }
            Err(err) => {
                self.store.lock().await.record_load_failure();
                warn!("Loader failed: {}", err);
                Err(err)
            }
        }
    }

    // == Invalidate ==
    /// Drops the cached value for `key`.
    ///
    /// A load already in flight for `key` still stores its result.
    pub async fn invalidate(&self, key: &K) -> Option<V> {
        self.store.lock().await.remove(key)
    }

    pub async fn clear(&self) {
        self.store.lock().await.clear();
    }

    /// Reads a value without promotion or statistics.
    pub async fn peek(&self, key: &K) -> Option<V> {
        self.store.lock().await.peek(key).cloned()
    }

    pub async fn len(&self) -> usize {
        self.store.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.lock().await.is_empty()
    }

    pub async fn stats(&self) -> CacheStats {
        self.store.lock().await.stats()
    }

    pub async fn capacity(&self) -> usize {
        self.store.lock().await.capacity()
    }

    /// Number of loads currently in progress.
    pub fn in_flight(&self) -> usize {
        self.in_flight.lock().len()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CacheError;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    struct SlowLoader {
        calls: AtomicUsize,
        fail: AtomicBool,
        fail_once: AtomicBool,
    }

    impl SlowLoader {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: AtomicBool::new(false),
                fail_once: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl AsyncLoader<String, String> for SlowLoader {
        async fn load(&self, key: &String) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            if self.fail.load(Ordering::SeqCst) || self.fail_once.swap(false, Ordering::SeqCst) {
                Err(CacheError::LoadFailed(format!("no backend for {}", key)))
            } else {
                Ok(format!("value_{}", key))
            }
        }
    }

    #[tokio::test]
    async fn test_shared_zero_capacity() {
        let result = SharedCache::new(0, SlowLoader::new());
        assert!(matches!(result, Err(CacheError::InvalidConfiguration(_))));
    }

    #[tokio::test]
    async fn test_shared_get_populates() {
        let cache = SharedCache::new(4, SlowLoader::new()).unwrap();
        let key = "k".to_string();

        assert_eq!(cache.get(&key).await.unwrap(), "value_k");
        assert_eq!(cache.get(&key).await.unwrap(), "value_k");

        assert_eq!(cache.peek(&key).await, Some("value_k".to_string()));
        assert_eq!(cache.loader.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.in_flight(), 0);

        let stats = cache.stats().await;
        assert_eq!(stats.loads, 1);
        assert_eq!(stats.hits, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_shared_coalesces_concurrent_misses() {
        let cache = SharedCache::new(4, SlowLoader::new()).unwrap();

        let mut handles = vec![];
        for _ in 0..16 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move { cache.get(&"hot".to_string()).await }));
        }

        for handle in handles {
            let value = handle.await.expect("Task should not panic").unwrap();
            assert_eq!(value, "value_hot");
        }

        assert_eq!(cache.loader.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_shared_failed_load_not_cached() {
        let loader = Arc::new(SlowLoader::new());
        loader.fail.store(true, Ordering::SeqCst);
        let cache = SharedCache::with_loader(2, Arc::clone(&loader)).unwrap();
        let key = "missing".to_string();

        let result = cache.get(&key).await;

        assert!(matches!(result, Err(CacheError::LoadFailed(_))));
        assert!(cache.is_empty().await);
        assert_eq!(cache.in_flight(), 0);
        assert_eq!(cache.stats().await.load_failures, 1);

        loader.fail.store(false, Ordering::SeqCst);
        assert_eq!(cache.get(&key).await.unwrap(), "value_missing");
        assert_eq!(loader.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_shared_capacity_under_concurrency() {
        let cache = SharedCache::new(3, SlowLoader::new()).unwrap();

        let mut handles = vec![];
        for i in 0..20 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move { cache.get(&format!("key{}", i % 7)).await }));
        }

        for handle in handles {
            assert!(handle.await.expect("Task should not panic").is_ok());
        }

        assert!(cache.len().await <= 3);
        assert_eq!(cache.capacity().await, 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_shared_waiters_retry_after_failed_load() {
        let loader = Arc::new(SlowLoader::new());
        loader.fail_once.store(true, Ordering::SeqCst);
        let cache = SharedCache::with_loader(4, Arc::clone(&loader)).unwrap();

        let first = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.get(&"k".to_string()).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        let mut waiters = vec![];
        for _ in 0..2 {
            let cache = cache.clone();
            waiters.push(tokio::spawn(async move { cache.get(&"k".to_string()).await }));
        }

        let result = first.await.expect("Task should not panic");
        assert!(matches!(result, Err(CacheError::LoadFailed(_))));
        for waiter in waiters {
            assert_eq!(waiter.await.expect("Task should not panic").unwrap(), "value_k");
        }

        assert_eq!(loader.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.peek(&"k".to_string()).await, Some("value_k".to_string()));
        assert_eq!(cache.in_flight(), 0);

        let stats = cache.stats().await;
        assert_eq!(stats.loads, 1);
        assert_eq!(stats.load_failures, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_shared_value_stored_before_join_is_not_reloaded() {
        let cache = SharedCache::new(4, SlowLoader::new()).unwrap();
        let key = "k".to_string();

        // Keep the caller between its store miss and joining the in-flight map.
        let slots = cache.in_flight.lock();
        let handle = {
            let cache = cache.clone();
            let key = key.clone();
            tokio::spawn(async move { cache.get(&key).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        cache.store.lock().await.put(key.clone(), "stored".to_string());
        drop(slots);

        let value = handle.await.expect("Task should not panic").unwrap();

        assert_eq!(value, "stored");
        assert_eq!(cache.loader.calls.load(Ordering::SeqCst), 0);
        assert_eq!(cache.stats().await.misses, 1);
        assert_eq!(cache.in_flight(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_shared_cancelled_load_releases_slot() {
        let cache = SharedCache::new(4, SlowLoader::new()).unwrap();
        let key = "k".to_string();

        let handle = {
            let cache = cache.clone();
            let key = key.clone();
            tokio::spawn(async move { cache.get(&key).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(cache.in_flight(), 1);

        // The load finishes while the store is locked, then its caller goes away.
        let store = cache.store.lock().await;
        tokio::time::sleep(Duration::from_millis(80)).await;
        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());
        drop(store);

        assert_eq!(cache.in_flight(), 0);
        assert!(cache.is_empty().await);

        assert_eq!(cache.get(&key).await.unwrap(), "value_k");
        assert_eq!(cache.loader.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_shared_invalidate() {
        let cache = SharedCache::new(2, SlowLoader::new()).unwrap();
        let key = "a".to_string();

        cache.get(&key).await.unwrap();
        assert_eq!(cache.invalidate(&key).await, Some("value_a".to_string()));
        assert!(cache.is_empty().await);

        cache.get(&key).await.unwrap();
        assert_eq!(cache.loader.calls.load(Ordering::SeqCst), 2);

        cache.clear().await;
        assert!(cache.is_empty().await);
    }
}
