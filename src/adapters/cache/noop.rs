//! Cache invalidator for deployments without a cache.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, UserId};
use crate::ports::CacheInvalidator;

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCacheInvalidator;

#[async_trait]
impl CacheInvalidator for NoopCacheInvalidator {
    async fn invalidate_user(&self, _user_id: &UserId) -> Result<(), DomainError> {
        Ok(())
    }
}
