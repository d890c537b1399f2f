//! CacheInvalidator port - Drops cached user snapshots.
//!
//! Each user has a single cache key. Deleting it means the next read
//! recomputes from the store. Mutating operations must finish invalidation
//! before reporting success.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, UserId};

#[async_trait]
pub trait CacheInvalidator: Send + Sync {
    /// Removes the cached snapshot for `user_id`. Missing keys are not an error.
    async fn invalidate_user(&self, user_id: &UserId) -> Result<(), DomainError>;
}

/// Cache key holding a user's snapshot.
pub fn user_cache_key(user_id: &UserId) -> String {
    format!("user:{}", user_id)
}
