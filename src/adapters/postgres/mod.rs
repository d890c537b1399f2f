//! PostgreSQL adapters - Database implementations of the storage ports.
//!
//! - `PostgresEventLedger` - `payment_events` table, idempotent by `event_id`
//! - `PostgresSubscriptionStore` - subscription columns of the `users` table

mod event_ledger;
mod subscription_store;

pub use event_ledger::PostgresEventLedger;
pub use subscription_store::PostgresSubscriptionStore;
