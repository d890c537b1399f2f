//! PostgreSQL implementation of EventLedger.
//!
//! `payment_events.event_id` is the primary key. `record_event` relies on
//! `INSERT ... ON CONFLICT DO NOTHING`, so concurrent deliveries of one id
//! produce exactly one row and every loser reads the winner's row.

use crate::domain::foundation::{DomainError, ErrorCode, EventId, Timestamp, UserId};
use crate::domain::subscription::PaymentEvent;
use crate::ports::{EventLedger, RecordedEvent};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

const SELECT_COLS: &str = "event_id, event_type, user_id, data, received_at, processed, \
     processed_at, failure_reason, attempt_count";

/// PostgreSQL implementation of the EventLedger port.
pub struct PostgresEventLedger {
    pool: PgPool,
}

impl PostgresEventLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch(&self, event_id: &EventId) -> Result<Option<PaymentEvent>, DomainError> {
        let row: Option<PaymentEventRow> = sqlx::query_as(&format!(
            "SELECT {} FROM payment_events WHERE event_id = $1",
            SELECT_COLS
        ))
        .bind(event_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find payment event", e))?;

        row.map(PaymentEvent::try_from).transpose()
    }
}

/// Database row representation of a payment event.
#[derive(Debug, sqlx::FromRow)]
struct PaymentEventRow {
    event_id: String,
    event_type: String,
    user_id: String,
    data: serde_json::Value,
    received_at: DateTime<Utc>,
    processed: bool,
    processed_at: Option<DateTime<Utc>>,
    failure_reason: Option<String>,
    attempt_count: i32,
}

impl TryFrom<PaymentEventRow> for PaymentEvent {
    type Error = DomainError;

    fn try_from(row: PaymentEventRow) -> Result<Self, Self::Error> {
        let invalid = |field: &str, e: crate::domain::foundation::ValidationError| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Invalid {} in payment_events: {}", field, e),
            )
        };

        Ok(PaymentEvent {
            event_id: EventId::new(row.event_id).map_err(|e| invalid("event_id", e))?,
            event_type: row.event_type,
            user_id: UserId::new(row.user_id).map_err(|e| invalid("user_id", e))?,
            data: row.data,
            received_at: Timestamp::from_datetime(row.received_at),
            processed: row.processed,
            processed_at: row.processed_at.map(Timestamp::from_datetime),
            failure_reason: row.failure_reason,
            attempt_count: u32::try_from(row.attempt_count).unwrap_or(0),
        })
    }
}

fn db_error(context: &str, e: sqlx::Error) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("{}: {}", context, e))
}

fn event_not_found(event_id: &EventId) -> DomainError {
    DomainError::new(
        ErrorCode::EventNotFound,
        format!("Payment event {} not found", event_id),
    )
}

#[async_trait]
impl EventLedger for PostgresEventLedger {
    async fn record_event(
        &self,
        event_id: &EventId,
        event_type: &str,
        user_id: &UserId,
        data: &serde_json::Value,
    ) -> Result<RecordedEvent, DomainError> {
        let inserted: Option<PaymentEventRow> = sqlx::query_as(&format!(
            r#"
            INSERT INTO payment_events (event_id, event_type, user_id, data, received_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (event_id) DO NOTHING
            RETURNING {}
            "#,
            SELECT_COLS
        ))
        .bind(event_id.as_str())
        .bind(event_type)
        .bind(user_id.as_str())
        .bind(data)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to record payment event", e))?;

        if let Some(row) = inserted {
            return Ok(RecordedEvent::created(row.try_into()?));
        }

        // Lost the insert race or a redelivery; the row exists.
        let existing = self
            .fetch(event_id)
            .await?
            .ok_or_else(|| event_not_found(event_id))?;
        Ok(RecordedEvent::existing(existing))
    }

    async fn mark_processed(&self, event_id: &EventId) -> Result<PaymentEvent, DomainError> {
        let row: Option<PaymentEventRow> = sqlx::query_as(&format!(
            r#"
            UPDATE payment_events SET
                processed = TRUE,
                processed_at = COALESCE(processed_at, $2)
            WHERE event_id = $1
            RETURNING {}
            "#,
            SELECT_COLS
        ))
        .bind(event_id.as_str())
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to mark payment event processed", e))?;

        row.ok_or_else(|| event_not_found(event_id))?.try_into()
    }

    async fn mark_failed(
        &self,
        event_id: &EventId,
        reason: &str,
    ) -> Result<PaymentEvent, DomainError> {
        let row: Option<PaymentEventRow> = sqlx::query_as(&format!(
            r#"
            UPDATE payment_events SET
                failure_reason = $2,
                attempt_count = attempt_count + 1
            WHERE event_id = $1
            RETURNING {}
            "#,
            SELECT_COLS
        ))
        .bind(event_id.as_str())
        .bind(reason)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to mark payment event failed", e))?;

        row.ok_or_else(|| event_not_found(event_id))?.try_into()
    }

    async fn find_by_event_id(
        &self,
        event_id: &EventId,
    ) -> Result<Option<PaymentEvent>, DomainError> {
        self.fetch(event_id).await
    }

    async fn list_unprocessed(&self, limit: u32) -> Result<Vec<PaymentEvent>, DomainError> {
        let rows: Vec<PaymentEventRow> = sqlx::query_as(&format!(
            r#"
            SELECT {}
            FROM payment_events
            WHERE processed = FALSE
            ORDER BY received_at ASC
            LIMIT $1
            "#,
            SELECT_COLS
        ))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list unprocessed payment events", e))?;

        rows.into_iter().map(PaymentEvent::try_from).collect()
    }
}
