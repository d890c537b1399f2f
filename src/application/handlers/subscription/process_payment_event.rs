//! EventDispatcher - Idempotent entry point for gateway events.
//!
//! Flow for each delivery:
//!
//! 1. Record the event in the ledger (one row per `event_id`, ever).
//! 2. If the row already existed and is processed, stop. The handler is not run again.
//! 3. Look up the handler for the type. Unknown types are logged and acknowledged.
//! 4. Handler success marks the row processed.
//! 5. Handler failure records the reason, bumps `attempt_count` and returns the
//!    error so the event source redelivers.

use std::sync::Arc;

use super::event_handlers::{HandlerOutcome, HandlerRegistry};
use crate::domain::foundation::{EventId, UserId};
use crate::domain::subscription::{EventPayload, PaymentEventType, SubscriptionError};
use crate::ports::EventLedger;

/// Command delivered by the inbound transport.
#[derive(Debug, Clone)]
pub struct ProcessPaymentEventCommand {
    pub event_id: String,
    pub event_type: String,
    pub user_id: String,
    pub payload: serde_json::Value,
}

/// How a delivery was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Handler ran and changed the subscription record.
    Applied,
    /// Handler ran; the event carried no record change.
    NoChange,
    /// Handler ran; the event was older than the record's state.
    Stale,
    /// Event id was already processed; nothing ran.
    Duplicate,
    /// No handler for this type; acknowledged without action.
    Ignored,
}

impl From<HandlerOutcome> for ProcessOutcome {
    fn from(outcome: HandlerOutcome) -> Self {
        match outcome {
            HandlerOutcome::Applied => ProcessOutcome::Applied,
            HandlerOutcome::NoChange => ProcessOutcome::NoChange,
            HandlerOutcome::Stale => ProcessOutcome::Stale,
        }
    }
}

/// Result of a successful delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessPaymentEventResult {
    pub event_id: EventId,
    pub outcome: ProcessOutcome,
}

/// Totals of one [`EventDispatcher::replay_unprocessed`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Routes ingested events through the ledger to their handlers.
pub struct EventDispatcher {
    ledger: Arc<dyn EventLedger>,
    registry: HandlerRegistry,
}

impl EventDispatcher {
    pub fn new(ledger: Arc<dyn EventLedger>, registry: HandlerRegistry) -> Self {
        Self { ledger, registry }
    }

    pub async fn handle(
        &self,
        cmd: ProcessPaymentEventCommand,
    ) -> Result<ProcessPaymentEventResult, SubscriptionError> {
        let event_id = EventId::new(cmd.event_id)?;
        let user_id = UserId::new(cmd.user_id)?;
        let kind = PaymentEventType::parse(&cmd.event_type)?;

        // 1. Record (or find) the ledger row
        let recorded = self
            .ledger
            .record_event(&event_id, &cmd.event_type, &user_id, &cmd.payload)
            .await?;

        // 2. Idempotency short-circuit
        if recorded.is_duplicate() {
            tracing::debug!(
                event_id = %event_id,
                event_type = %kind,
                "Payment event already processed, skipping"
            );
            return Ok(ProcessPaymentEventResult {
                event_id,
                outcome: ProcessOutcome::Duplicate,
            });
        }

        // 3. Route by type
        let Some(handler) = self.registry.get(&kind) else {
            tracing::warn!(
                event_id = %event_id,
                event_type = %kind,
                user_id = %user_id,
                "No handler registered for payment event type, acknowledging"
            );
            self.ledger.mark_processed(&event_id).await?;
            return Ok(ProcessPaymentEventResult {
                event_id,
                outcome: ProcessOutcome::Ignored,
            });
        };

        let result = match EventPayload::from_value(&cmd.payload) {
            Ok(payload) => handler.handle(&user_id, &payload).await,
            Err(e) => Err(e.into()),
        };

        match result {
            // 4. Success
            Ok(outcome) => {
                self.ledger.mark_processed(&event_id).await?;
                Ok(ProcessPaymentEventResult {
                    event_id,
                    outcome: outcome.into(),
                })
            }
            // 5. Failure: leave the row retryable
            Err(err) => {
                match self.ledger.mark_failed(&event_id, &err.message()).await {
                    Ok(entry) => tracing::warn!(
                        event_id = %event_id,
                        event_type = %kind,
                        user_id = %user_id,
                        attempt_count = entry.attempt_count,
                        error = %err,
                        "Payment event handler failed"
                    ),
                    Err(ledger_err) => tracing::error!(
                        event_id = %event_id,
                        event_type = %kind,
                        error = %err,
                        ledger_error = %ledger_err,
                        "Payment event handler failed and the failure could not be recorded"
                    ),
                }
                Err(err)
            }
        }
    }

    /// Re-dispatches up to `limit` unprocessed ledger rows, oldest first.
    ///
    /// A failing row is counted and the pass moves on; `handle` has already
    /// logged it and bumped its attempt count.
    pub async fn replay_unprocessed(&self, limit: u32) -> Result<ReplaySummary, SubscriptionError> {
        let pending = self.ledger.list_unprocessed(limit).await?;
        let mut summary = ReplaySummary::default();

        for entry in pending {
            summary.attempted += 1;
            let cmd = ProcessPaymentEventCommand {
                event_id: entry.event_id.as_str().to_string(),
                event_type: entry.event_type,
                user_id: entry.user_id.as_str().to_string(),
                payload: entry.data,
            };
            match self.handle(cmd).await {
                Ok(_) => summary.succeeded += 1,
                Err(_) => summary.failed += 1,
            }
        }

        tracing::info!(
            attempted = summary.attempted,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Replayed unprocessed payment events"
        );
        Ok(summary)
    }
}
