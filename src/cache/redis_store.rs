//! Redis-backed cache store.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use tracing::debug;

use super::keys::CacheKey;
use super::store::{CacheError, CacheStore};

const BACKEND: &str = "redis";

/// Store shared between processes through one Redis instance. Expiry is delegated to
/// Redis (`SET .. PX`, `PEXPIRE`).
#[derive(Clone)]
pub struct RedisCacheStore {
    connection: ConnectionManager,
}

impl RedisCacheStore {
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(url).map_err(|err| CacheError::backend(BACKEND, err))?;
        let connection = ConnectionManager::new(client)
            .await
            .map_err(|err| CacheError::backend(BACKEND, err))?;
        Ok(Self { connection })
    }
}

fn generation_key(key: &CacheKey) -> String {
    format!("{key}:generation")
}

fn ttl_millis(ttl: Duration) -> Result<u64, CacheError> {
    let millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
    if millis == 0 {
        return Err(CacheError::ZeroTtl);
    }
    Ok(millis)
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &CacheKey) -> Result<Option<String>, CacheError> {
        let mut conn = self.connection.clone();
        let value: Option<String> = redis::cmd("GET")
            .arg(key.to_string())
            .query_async(&mut conn)
            .await
            .map_err(|err| CacheError::backend(BACKEND, err))?;
        Ok(value)
    }

    async fn set_with_ttl(
        &self,
        key: &CacheKey,
        value: String,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let millis = ttl_millis(ttl)?;
        let mut conn = self.connection.clone();
        redis::cmd("SET")
            .arg(key.to_string())
            .arg(value)
            .arg("PX")
            .arg(millis)
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(|err| CacheError::backend(BACKEND, err))?;
        debug!(target = "cache::redis_store", key = %key, ttl_ms = millis, "redis entry written");
        Ok(())
    }

    async fn force_expire(&self, key: &CacheKey, ttl: Duration) -> Result<bool, CacheError> {
        let millis = ttl_millis(ttl)?;
        let mut conn = self.connection.clone();
        let applied: i64 = redis::cmd("PEXPIRE")
            .arg(key.to_string())
            .arg(millis)
            .query_async(&mut conn)
            .await
            .map_err(|err| CacheError::backend(BACKEND, err))?;
        Ok(applied == 1)
    }

    async fn generation(&self, key: &CacheKey) -> Result<u64, CacheError> {
        let mut conn = self.connection.clone();
        let value: Option<u64> = redis::cmd("GET")
            .arg(generation_key(key))
            .query_async(&mut conn)
            .await
            .map_err(|err| CacheError::backend(BACKEND, err))?;
        Ok(value.unwrap_or(0))
    }

    async fn bump_generation(&self, key: &CacheKey) -> Result<u64, CacheError> {
        let mut conn = self.connection.clone();
        redis::cmd("INCR")
            .arg(generation_key(key))
            .query_async(&mut conn)
            .await
            .map_err(|err| CacheError::backend(BACKEND, err))
    }

    fn backend(&self) -> &'static str {
        BACKEND
    }
}
