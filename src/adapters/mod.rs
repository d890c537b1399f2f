//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `postgres` - Event ledger and subscription store (sqlx)
//! - `gateway` - Payment microservice client (reqwest) and a scriptable mock
//! - `cache` - Redis invalidation of the user cache
//! - `memory` - In-process ledger and store for tests and local runs

pub mod cache;
pub mod gateway;
pub mod memory;
pub mod postgres;

pub use cache::{NoopCacheInvalidator, RedisCacheInvalidator};
pub use gateway::{HttpGatewayClient, MockGatewayClient};
pub use memory::{InMemoryEventLedger, InMemorySubscriptionStore, RecordingCacheInvalidator};
pub use postgres::{PostgresEventLedger, PostgresSubscriptionStore};
