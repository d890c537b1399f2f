//! Per-type payment event handlers and the table that routes to them.
//!
//! Every handler that mutates the subscription record invalidates the user's
//! cache entry as its last step before returning.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::foundation::{Timestamp, UserId};
use crate::domain::subscription::{
    EventPayload, PaymentEventType, SubscriptionError, SubscriptionRecord,
};
use crate::ports::{CacheInvalidator, SubscriptionStore};

/// What a handler did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerOutcome {
    /// The subscription record was rewritten.
    Applied,
    /// The event predates what the record already reflects; nothing written.
    Stale,
    /// The event carries no subscription change.
    NoChange,
}

/// Handles one kind of payment event.
#[async_trait]
pub trait PaymentEventHandler: Send + Sync {
    async fn handle(
        &self,
        user_id: &UserId,
        payload: &EventPayload,
    ) -> Result<HandlerOutcome, SubscriptionError>;
}

/// Type to handler table used by the dispatcher.
#[derive(Default, Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<PaymentEventType, Arc<dyn PaymentEventHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with a handler for every known event type.
    pub fn standard(
        store: Arc<dyn SubscriptionStore>,
        cache: Arc<dyn CacheInvalidator>,
    ) -> Self {
        let writer = RecordWriter { store, cache };
        let snapshot: Arc<dyn PaymentEventHandler> =
            Arc::new(SnapshotHandler { writer: writer.clone() });

        Self::new()
            .register(PaymentEventType::Created, snapshot.clone())
            .register(PaymentEventType::Updated, snapshot)
            .register(
                PaymentEventType::Renewed,
                Arc::new(RenewedHandler { writer: writer.clone() }),
            )
            .register(
                PaymentEventType::Cancelled,
                Arc::new(CancelledHandler { writer }),
            )
            .register(
                PaymentEventType::PaymentSucceeded,
                Arc::new(PaymentNotificationHandler {
                    kind: PaymentEventType::PaymentSucceeded,
                }),
            )
            .register(
                PaymentEventType::PaymentFailed,
                Arc::new(PaymentNotificationHandler {
                    kind: PaymentEventType::PaymentFailed,
                }),
            )
    }

    /// Adds or replaces the handler for `kind`.
    pub fn register(mut self, kind: PaymentEventType, handler: Arc<dyn PaymentEventHandler>) -> Self {
        self.handlers.insert(kind, handler);
        self
    }

    pub fn get(&self, kind: &PaymentEventType) -> Option<Arc<dyn PaymentEventHandler>> {
        self.handlers.get(kind).cloned()
    }

    pub fn contains(&self, kind: &PaymentEventType) -> bool {
        self.handlers.contains_key(kind)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Read-modify-write of a single user's record, shared by the mutating handlers.
#[derive(Clone)]
struct RecordWriter {
    store: Arc<dyn SubscriptionStore>,
    cache: Arc<dyn CacheInvalidator>,
}

impl RecordWriter {
    async fn apply<F>(
        &self,
        user_id: &UserId,
        occurred_at: Option<Timestamp>,
        mutate: F,
    ) -> Result<HandlerOutcome, SubscriptionError>
    where
        F: FnOnce(&mut SubscriptionRecord, Timestamp) -> Result<(), SubscriptionError> + Send,
    {
        let mut record = self.store.get(user_id).await?;

        if record.is_stale(occurred_at) {
            tracing::info!(
                user_id = %user_id,
                occurred_at = ?occurred_at,
                last_event_at = ?record.last_event_at,
                "Skipping stale payment event"
            );
            return Ok(HandlerOutcome::Stale);
        }

        mutate(&mut record, Timestamp::now())?;
        record.observe_event(occurred_at);

        self.store.update_subscription(user_id, &record).await?;
        self.cache.invalidate_user(user_id).await?;

        Ok(HandlerOutcome::Applied)
    }
}

/// `created` and `updated`: authoritative full replace from the payload.
struct SnapshotHandler {
    writer: RecordWriter,
}

#[async_trait]
impl PaymentEventHandler for SnapshotHandler {
    async fn handle(
        &self,
        user_id: &UserId,
        payload: &EventPayload,
    ) -> Result<HandlerOutcome, SubscriptionError> {
        let snapshot = payload.to_snapshot()?;
        let occurred_at = payload.occurred_at()?;

        self.writer
            .apply(user_id, occurred_at, move |record, now| {
                record.apply_snapshot(snapshot, now)
            })
            .await
    }
}

/// `renewed`: back to active, with plan and period end taken from the payload when present.
struct RenewedHandler {
    writer: RecordWriter,
}

#[async_trait]
impl PaymentEventHandler for RenewedHandler {
    async fn handle(
        &self,
        user_id: &UserId,
        payload: &EventPayload,
    ) -> Result<HandlerOutcome, SubscriptionError> {
        let plan = payload.plan()?;
        let period_end = payload.current_period_end()?;
        let occurred_at = payload.occurred_at()?;

        self.writer
            .apply(user_id, occurred_at, move |record, now| {
                record.renew(plan, period_end, now)
            })
            .await
    }
}

/// `cancelled`: stops billing but keeps plan and provider reference.
struct CancelledHandler {
    writer: RecordWriter,
}

#[async_trait]
impl PaymentEventHandler for CancelledHandler {
    async fn handle(
        &self,
        user_id: &UserId,
        payload: &EventPayload,
    ) -> Result<HandlerOutcome, SubscriptionError> {
        let period_end = payload.current_period_end()?;
        let occurred_at = payload.occurred_at()?;

        self.writer
            .apply(user_id, occurred_at, move |record, now| {
                record.cancel(period_end, now)
            })
            .await
    }
}

/// `payment.succeeded` / `payment.failed`: observed only.
struct PaymentNotificationHandler {
    kind: PaymentEventType,
}

#[async_trait]
impl PaymentEventHandler for PaymentNotificationHandler {
    async fn handle(
        &self,
        user_id: &UserId,
        _payload: &EventPayload,
    ) -> Result<HandlerOutcome, SubscriptionError> {
        tracing::info!(
            user_id = %user_id,
            event_type = %self.kind,
            "Payment notification received"
        );
        Ok(HandlerOutcome::NoChange)
    }
}
