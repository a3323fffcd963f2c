use async_trait::async_trait;
use std::time::Duration;

use crate::domain::DomainError;

/// TTL-keyed string cache plus a per-repository atomic version counter used
/// to invalidate stale query results (§4.8). Backed by Redis.
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, DomainError>;

    /// `ttl == Duration::ZERO` means no expiry.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError>;

    async fn delete(&self, key: &str) -> Result<(), DomainError>;

    /// Atomically increments and returns the index version for `repo`,
    /// invalidating every cache key built against the prior version.
    async fn incr_index_version(&self, repo: &str) -> Result<i64, DomainError>;

    async fn index_version(&self, repo: &str) -> Result<i64, DomainError>;
}
