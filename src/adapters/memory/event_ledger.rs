//! In-memory event ledger for tests and local runs.
//!
//! The check-and-insert in `record_event` happens under one lock, which gives
//! the same single-winner guarantee as the primary key in PostgreSQL.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, ErrorCode, EventId, Timestamp, UserId};
use crate::domain::subscription::PaymentEvent;
use crate::ports::{EventLedger, RecordedEvent};

#[derive(Default)]
pub struct InMemoryEventLedger {
    rows: Mutex<HashMap<String, PaymentEvent>>,
}

impl InMemoryEventLedger {
    pub fn new() -> Self {
        Self::default()
    }

    // === Test Helpers ===

    /// Number of rows ever created.
    pub fn len(&self) -> usize {
        self.rows().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows().is_empty()
    }

    /// Snapshot of a row.
    pub fn row(&self, event_id: &str) -> Option<PaymentEvent> {
        self.rows().get(event_id).cloned()
    }

    fn rows(&self) -> MutexGuard<'_, HashMap<String, PaymentEvent>> {
        self.rows.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn update<F>(&self, event_id: &EventId, f: F) -> Result<PaymentEvent, DomainError>
    where
        F: FnOnce(&mut PaymentEvent),
    {
        let mut rows = self.rows();
        let row = rows.get_mut(event_id.as_str()).ok_or_else(|| {
            DomainError::new(
                ErrorCode::EventNotFound,
                format!("Payment event {} not found", event_id),
            )
        })?;
        f(row);
        Ok(row.clone())
    }
}

#[async_trait]
impl EventLedger for InMemoryEventLedger {
    async fn record_event(
        &self,
        event_id: &EventId,
        event_type: &str,
        user_id: &UserId,
        data: &serde_json::Value,
    ) -> Result<RecordedEvent, DomainError> {
        let mut rows = self.rows();
        if let Some(existing) = rows.get(event_id.as_str()) {
            return Ok(RecordedEvent::existing(existing.clone()));
        }
        let entry = PaymentEvent::received(
            event_id.clone(),
            event_type,
            user_id.clone(),
            data.clone(),
            Timestamp::now(),
        );
        rows.insert(event_id.as_str().to_string(), entry.clone());
        Ok(RecordedEvent::created(entry))
    }

    async fn mark_processed(&self, event_id: &EventId) -> Result<PaymentEvent, DomainError> {
        self.update(event_id, |row| row.mark_processed(Timestamp::now()))
    }

    async fn mark_failed(
        &self,
        event_id: &EventId,
        reason: &str,
    ) -> Result<PaymentEvent, DomainError> {
        self.update(event_id, |row| row.mark_failed(reason))
    }

    async fn find_by_event_id(
        &self,
        event_id: &EventId,
    ) -> Result<Option<PaymentEvent>, DomainError> {
        Ok(self.row(event_id.as_str()))
    }

    async fn list_unprocessed(&self, limit: u32) -> Result<Vec<PaymentEvent>, DomainError> {
        let mut pending: Vec<PaymentEvent> = self
            .rows()
            .values()
            .filter(|e| !e.processed)
            .cloned()
            .collect();
        pending.sort_by_key(|e| e.received_at);
        pending.truncate(limit as usize);
        Ok(pending)
    }
}
