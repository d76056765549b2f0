//! Cache storage: the `CacheStore` contract and its in-process implementation.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use lru::LruCache;
use thiserror::Error;
use tokio::time::Instant;

use super::config::CacheConfig;
use super::keys::CacheKey;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("{backend} cache backend error: {message}")]
    Backend {
        backend: &'static str,
        message: String,
    },
    #[error("cache ttl must be greater than zero")]
    ZeroTtl,
}

impl CacheError {
    pub fn backend(backend: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Backend {
            backend,
            message: err.to_string(),
        }
    }
}

/// Key/value store with per-key expiry.
///
/// There is no atomicity across `get` and `set_with_ttl`; two concurrent misses may
/// both write and the last write wins.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// The stored value, or `None` when absent or past its deadline.
    async fn get(&self, key: &CacheKey) -> Result<Option<String>, CacheError>;

    async fn set_with_ttl(
        &self,
        key: &CacheKey,
        value: String,
        ttl: Duration,
    ) -> Result<(), CacheError>;

    /// Reset the remaining lifetime of a live entry to `ttl`. Returns whether an entry
    /// was found.
    async fn force_expire(&self, key: &CacheKey, ttl: Duration) -> Result<bool, CacheError>;

    /// Counter for `key`, bumped whenever the data behind it changes. Starts at 0 and
    /// never expires, so a refresh can tell whether a change raced with it.
    async fn generation(&self, key: &CacheKey) -> Result<u64, CacheError>;

    /// Increment the counter for `key` and return the new value.
    async fn bump_generation(&self, key: &CacheKey) -> Result<u64, CacheError>;

    fn backend(&self) -> &'static str;
}

struct Entry {
    value: String,
    expires_at: Instant,
}

/// In-process store. Deadlines follow the tokio clock, so paused-time tests can step
/// over them.
pub struct MemoryCacheStore {
    entries: RwLock<LruCache<String, Entry>>,
    generations: RwLock<HashMap<String, u64>>,
}

impl MemoryCacheStore {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: RwLock::new(LruCache::new(config.max_entries_non_zero())),
            generations: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored entries, expired ones included until they are touched.
    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &CacheKey) -> Result<Option<String>, CacheError> {
        let key = key.to_string();
        let now = Instant::now();
        let mut entries = rw_write(&self.entries, SOURCE, "get");
        if let Some(entry) = entries.get(&key) {
            if entry.expires_at > now {
                return Ok(Some(entry.value.clone()));
            }
        }
        entries.pop(&key);
        Ok(None)
    }

    async fn set_with_ttl(
        &self,
        key: &CacheKey,
        value: String,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        if ttl.is_zero() {
            return Err(CacheError::ZeroTtl);
        }
        let entry = Entry {
            value,
            expires_at: Instant::now() + ttl,
        };
        rw_write(&self.entries, SOURCE, "set_with_ttl").put(key.to_string(), entry);
        Ok(())
    }

    async fn force_expire(&self, key: &CacheKey, ttl: Duration) -> Result<bool, CacheError> {
        if ttl.is_zero() {
            return Err(CacheError::ZeroTtl);
        }
        let key = key.to_string();
        let now = Instant::now();
        let mut entries = rw_write(&self.entries, SOURCE, "force_expire");
        match entries.peek_mut(&key) {
            Some(entry) if entry.expires_at > now => {
                entry.expires_at = now + ttl;
                Ok(true)
            }
            Some(_) => {
                entries.pop(&key);
                Ok(false)
            }
            None => Ok(false),
        }
    }

    async fn generation(&self, key: &CacheKey) -> Result<u64, CacheError> {
        let generations = rw_read(&self.generations, SOURCE, "generation");
        Ok(generations.get(&key.to_string()).copied().unwrap_or(0))
    }

    async fn bump_generation(&self, key: &CacheKey) -> Result<u64, CacheError> {
        let mut generations = rw_write(&self.generations, SOURCE, "bump_generation");
        let counter = generations.entry(key.to_string()).or_insert(0);
        *counter = counter.wrapping_add(1);
        Ok(*counter)
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
