//! Read-Through Cache - a bounded LRU cache in front of a data loader
//!
//! Lookups hit the cache first; misses are loaded from the backing source,
//! stored, and returned. Least recently used entries are evicted at capacity.

pub mod cache;
pub mod config;
pub mod dataset;
pub mod error;

pub use cache::{AsyncLoader, CacheStats, Loader, LruStore, ReadThroughCache, SharedCache};
pub use config::Config;
pub use dataset::{DataKey, SampleDataset};
pub use error::{CacheError, Result};
