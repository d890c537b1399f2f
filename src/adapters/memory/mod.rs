//! In-memory adapters.
//!
//! Used by tests and by local runs without PostgreSQL or Redis.

mod cache;
mod event_ledger;
mod subscription_store;

pub use cache::RecordingCacheInvalidator;
pub use event_ledger::InMemoryEventLedger;
pub use subscription_store::InMemorySubscriptionStore;
