//! Redis-backed cache invalidation.
//!
//! Deletes the `user:{id}` key holding the cached user snapshot. The next
//! read recomputes it from the store.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use std::time::Duration;

use crate::config::RedisConfig;
use crate::domain::foundation::{DomainError, ErrorCode, UserId};
use crate::ports::{user_cache_key, CacheInvalidator};

#[derive(Clone)]
pub struct RedisCacheInvalidator {
    conn: MultiplexedConnection,
    timeout: Duration,
}

impl RedisCacheInvalidator {
    pub fn new(conn: MultiplexedConnection, timeout: Duration) -> Self {
        Self { conn, timeout }
    }

    /// Opens a multiplexed connection using `config`.
    pub async fn connect(config: &RedisConfig) -> Result<Self, DomainError> {
        let client = redis::Client::open(config.url.as_str()).map_err(cache_error)?;
        let conn = tokio::time::timeout(config.timeout(), client.get_multiplexed_tokio_connection())
            .await
            .map_err(|_| DomainError::new(ErrorCode::CacheError, "Timed out connecting to Redis"))?
            .map_err(cache_error)?;
        Ok(Self::new(conn, config.timeout()))
    }
}

fn cache_error(e: redis::RedisError) -> DomainError {
    DomainError::new(ErrorCode::CacheError, format!("Redis error: {}", e))
}

#[async_trait]
impl CacheInvalidator for RedisCacheInvalidator {
    async fn invalidate_user(&self, user_id: &UserId) -> Result<(), DomainError> {
        let key = user_cache_key(user_id);
        let mut conn = self.conn.clone();

        let removed = tokio::time::timeout(self.timeout, conn.del::<_, i64>(&key))
            .await
            .map_err(|_| {
                DomainError::new(ErrorCode::CacheError, "Timed out invalidating cache")
                    .with_detail("key", key.as_str())
            })?
            .map_err(cache_error)?;

        tracing::debug!(key = %key, removed, "Invalidated user cache");
        Ok(())
    }
}

impl std::fmt::Debug for RedisCacheInvalidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCacheInvalidator")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
