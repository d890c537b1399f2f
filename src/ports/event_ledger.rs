//! EventLedger port - Append-only record of every gateway event received.
//!
//! The ledger is what makes event ingestion idempotent. The gateway delivers
//! at-least-once, so the same `event_id` may arrive many times, possibly
//! concurrently. Implementations must rely on a storage-level uniqueness
//! constraint on `event_id`: exactly one caller creates the row, every other
//! caller observes the existing row.
//!
//! Rows are never deleted. `processed` is never reset once set.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, EventId, UserId};
use crate::domain::subscription::PaymentEvent;

/// Outcome of [`EventLedger::record_event`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedEvent {
    /// Current ledger row for the event id.
    pub entry: PaymentEvent,

    /// True if the row was already present before this call.
    pub already_existed: bool,
}

impl RecordedEvent {
    pub fn created(entry: PaymentEvent) -> Self {
        Self {
            entry,
            already_existed: false,
        }
    }

    pub fn existing(entry: PaymentEvent) -> Self {
        Self {
            entry,
            already_existed: true,
        }
    }

    /// True if the event was already handled and must not be applied again.
    pub fn is_duplicate(&self) -> bool {
        self.already_existed && self.entry.processed
    }
}

/// Port for the idempotent event ledger.
#[async_trait]
pub trait EventLedger: Send + Sync {
    /// Inserts the event if its id is new, otherwise returns the stored row.
    ///
    /// Must be atomic with respect to concurrent calls for the same id.
    async fn record_event(
        &self,
        event_id: &EventId,
        event_type: &str,
        user_id: &UserId,
        data: &serde_json::Value,
    ) -> Result<RecordedEvent, DomainError>;

    /// Sets `processed = true` and `processed_at = now`.
    async fn mark_processed(&self, event_id: &EventId) -> Result<PaymentEvent, DomainError>;

    /// Stores the failure reason and increments `attempt_count`.
    async fn mark_failed(
        &self,
        event_id: &EventId,
        reason: &str,
    ) -> Result<PaymentEvent, DomainError>;

    async fn find_by_event_id(&self, event_id: &EventId)
        -> Result<Option<PaymentEvent>, DomainError>;

    /// Unprocessed rows, oldest first. Used by audit and replay tooling.
    async fn list_unprocessed(&self, limit: u32) -> Result<Vec<PaymentEvent>, DomainError>;
}
