//! Cache Module
//!
//! Provides a bounded LRU store and read-through caches built on top of it.

mod entry;
mod lru;
mod read_through;
mod shared;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use lru::{Iter, LruList};
pub use read_through::{Loader, ReadThroughCache};
pub use shared::{AsyncLoader, SharedCache};
pub use stats::CacheStats;
pub use store::LruStore;
