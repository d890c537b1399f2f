//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the billing core and the outside world. Adapters implement these ports.
//!
//! - `EventLedger` - Idempotent, append-only record of gateway events
//! - `SubscriptionStore` - Per-user subscription mirror
//! - `GatewayClient` - Outbound calls to the payment microservice
//! - `CacheInvalidator` - Per-user cache eviction

mod cache_invalidator;
mod event_ledger;
mod gateway_client;
mod subscription_store;

pub use cache_invalidator::{user_cache_key, CacheInvalidator};
pub use event_ledger::{EventLedger, RecordedEvent};
pub use gateway_client::{
    CancelAck, CheckoutRequest, CheckoutSession, GatewayClient, GatewayError, GatewayErrorKind,
};
pub use subscription_store::{user_not_found, SubscriptionStore};
