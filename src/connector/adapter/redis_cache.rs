use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use crate::application::Cache;
use crate::domain::DomainError;

/// Redis-backed [`Cache`] (§4.8). Grounded on the pack's `redis` precedent of
/// wrapping an `aio::ConnectionManager` (internally clonable, pooled) rather
/// than a bare connection, so the adapter can be `Arc`-shared across request
/// handlers without a lock.
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    pub async fn connect(url: &str) -> Result<Self, DomainError> {
        let client = redis::Client::open(url).map_err(|e| DomainError::CacheUnavailable(format!("invalid redis url {url}: {e}")))?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(|e| DomainError::CacheUnavailable(format!("redis connect failed: {e}")))?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, DomainError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await.map_err(|e| DomainError::CacheUnavailable(format!("GET {key} failed: {e}")))?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError> {
        let mut conn = self.conn.clone();
        if ttl.is_zero() {
            conn.set::<_, _, ()>(key, value).await.map_err(|e| DomainError::CacheUnavailable(format!("SET {key} failed: {e}")))?;
        } else {
            conn.set_ex::<_, _, ()>(key, value, ttl.as_secs()).await.map_err(|e| DomainError::CacheUnavailable(format!("SETEX {key} failed: {e}")))?;
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), DomainError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key).await.map_err(|e| DomainError::CacheUnavailable(format!("DEL {key} failed: {e}")))?;
        Ok(())
    }

    async fn incr_index_version(&self, repo: &str) -> Result<i64, DomainError> {
        let mut conn = self.conn.clone();
        let key = format!("index:version:{repo}");
        conn.incr(key.as_str(), 1).await.map_err(|e| DomainError::CacheUnavailable(format!("INCR {key} failed: {e}")))
    }

    async fn index_version(&self, repo: &str) -> Result<i64, DomainError> {
        let mut conn = self.conn.clone();
        let key = format!("index:version:{repo}");
        let value: Option<i64> = conn.get(key.as_str()).await.map_err(|e| DomainError::CacheUnavailable(format!("GET {key} failed: {e}")))?;
        Ok(value.unwrap_or(0))
    }
}
