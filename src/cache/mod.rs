//! Holocron entity-list cache.
//!
//! Serialized entity lists are stored under structured [`CacheKey`]s with a per-entry
//! TTL. Two backends exist:
//!
//! - **memory**: in-process LRU map, deadlines on the tokio clock
//! - **redis**: shared store, expiry handled by Redis
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! backend = "memory"          # or "redis"
//! redis_url = "redis://127.0.0.1:6379"
//! entry_ttl_seconds = 7200
//! invalidation_ttl_seconds = 1
//! max_entries = 256
//! ```

use std::sync::Arc;

mod config;
mod keys;
mod lock;
mod redis_store;
mod store;

pub use config::{CacheBackend, CacheConfig};
pub use keys::CacheKey;
pub use redis_store::RedisCacheStore;
pub use store::{CacheError, CacheStore, MemoryCacheStore};

/// Build the store selected by `config.backend`.
pub async fn build_store(config: &CacheConfig) -> Result<Arc<dyn CacheStore>, CacheError> {
    match &config.backend {
        CacheBackend::Memory => Ok(Arc::new(MemoryCacheStore::new(config))),
        CacheBackend::Redis { url } => Ok(Arc::new(RedisCacheStore::connect(url).await?)),
    }
}
