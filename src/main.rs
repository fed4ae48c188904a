//! Read-Through Cache demo
//!
//! Looks up a couple of ids through an LRU cache backed by the sample dataset.

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use read_through_cache::{Config, DataKey, ReadThroughCache, SampleDataset, SharedCache};

/// Main entry point for the demo.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Run lookups through a single-threaded read-through cache
/// 4. Repeat a lookup from several tasks through a shared cache
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "read_through_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;
    info!("Configuration loaded: capacity={}", config.capacity);

    let mut cache = ReadThroughCache::new(config.capacity, SampleDataset::sample())?;

    for key in [DataKey::Int(1), DataKey::Int(2), DataKey::Int(2)] {
        println!("{}", cache.get(&key)?);
    }
    info!(
        "Single-threaded cache stats: {}",
        serde_json::to_string(&cache.stats())?
    );

    let shared = SharedCache::new(config.capacity, SampleDataset::sample())?;
    let key = DataKey::from("3");

    let mut handles = Vec::new();
    for _ in 0..4 {
        let shared = shared.clone();
        let key = key.clone();
        handles.push(tokio::spawn(async move { shared.get(&key).await }));
    }
    for handle in handles {
        println!("{}", handle.await??);
    }
    info!(
        "Shared cache stats: {}",
        serde_json::to_string(&shared.stats().await)?
    );

    Ok(())
}
