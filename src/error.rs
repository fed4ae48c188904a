//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache.
///
/// A missing key is not an error: store lookups return `Option`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Capacity or configuration value out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Loader failed to produce a value; the store was not modified
    #[error("Load failed: {0}")]
    LoadFailed(String),

    /// Backing data could not be parsed
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::InvalidData(err.to_string())
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
