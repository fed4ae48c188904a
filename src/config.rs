//! Configuration Module
//!
//! Handles loading the cache configuration from environment variables.

use std::env;

use crate::error::{CacheError, Result};

/// Default capacity, matching the sample program's cache size.
pub const DEFAULT_CAPACITY: usize = 100;

/// Cache configuration parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Maximum number of entries the cache can hold
    pub capacity: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables,
    /// falling back to defaults for unset values.
    ///
    /// # Environment Variables
    /// - `CACHE_CAPACITY` - Maximum cache entries (default: 100)
    ///
    /// # Errors
    /// Returns `InvalidConfiguration` if `CACHE_CAPACITY` is set but is not a
    /// positive integer.
    pub fn from_env() -> Result<Self> {
        match env::var("CACHE_CAPACITY") {
            Ok(raw) => Self::from_capacity_str(&raw),
            Err(_) => Ok(Self::default()),
        }
    }

    /// Parses a capacity given as text, accepting only positive integers.
    pub fn from_capacity_str(raw: &str) -> Result<Self> {
        let parsed: i64 = raw.trim().parse().map_err(|_| {
            CacheError::InvalidConfiguration(format!("capacity '{}' is not an integer", raw))
        })?;

        if parsed < 1 {
            return Err(CacheError::InvalidConfiguration(format!(
                "capacity must be at least 1, got {}",
                parsed
            )));
        }

        Ok(Self {
            capacity: usize::try_from(parsed).map_err(|_| {
                CacheError::InvalidConfiguration(format!("capacity {} is too large", parsed))
            })?,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
        }
    }
}
