//! Cache invalidation adapters.
//!
//! - `RedisCacheInvalidator` - deletes `user:{id}` keys in Redis
//! - `NoopCacheInvalidator` - used when no cache is configured

mod noop;
mod redis;

pub use self::redis::RedisCacheInvalidator;
pub use noop::NoopCacheInvalidator;
