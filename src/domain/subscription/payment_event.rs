//! Payment events and their ledger entries.
//!
//! Every notification the gateway delivers is recorded once per `event_id`.
//! Entries are never deleted and `processed` never goes back to `false`.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{EventId, Timestamp, UserId, ValidationError};

/// Kinds of gateway notifications.
///
/// Unrecognised types are kept as `Unknown` so new gateway events never fail
/// ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentEventType {
    Created,
    Updated,
    Cancelled,
    Renewed,
    PaymentSucceeded,
    PaymentFailed,
    Unknown(String),
}

impl PaymentEventType {
    /// Every type the dispatcher knows how to route.
    pub const KNOWN: [PaymentEventType; 6] = [
        PaymentEventType::Created,
        PaymentEventType::Updated,
        PaymentEventType::Cancelled,
        PaymentEventType::Renewed,
        PaymentEventType::PaymentSucceeded,
        PaymentEventType::PaymentFailed,
    ];

    /// Parses a gateway type string.
    ///
    /// Accepts bare (`created`) and namespaced (`subscription.created`) forms.
    /// Only an empty string is rejected.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::empty_field("type"));
        }
        let name = trimmed.strip_prefix("subscription.").unwrap_or(trimmed);
        let parsed = match name {
            "created" => PaymentEventType::Created,
            "updated" => PaymentEventType::Updated,
            "cancelled" | "canceled" => PaymentEventType::Cancelled,
            "renewed" => PaymentEventType::Renewed,
            "payment.succeeded" => PaymentEventType::PaymentSucceeded,
            "payment.failed" => PaymentEventType::PaymentFailed,
            _ => PaymentEventType::Unknown(trimmed.to_string()),
        };
        Ok(parsed)
    }

    /// Canonical spelling.
    pub fn as_str(&self) -> &str {
        match self {
            PaymentEventType::Created => "created",
            PaymentEventType::Updated => "updated",
            PaymentEventType::Cancelled => "cancelled",
            PaymentEventType::Renewed => "renewed",
            PaymentEventType::PaymentSucceeded => "payment.succeeded",
            PaymentEventType::PaymentFailed => "payment.failed",
            PaymentEventType::Unknown(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, PaymentEventType::Unknown(_))
    }
}

impl std::fmt::Display for PaymentEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ledger row for one gateway event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentEvent {
    pub event_id: EventId,

    /// Type string as delivered.
    pub event_type: String,

    pub user_id: UserId,

    /// Opaque gateway payload.
    pub data: serde_json::Value,

    pub received_at: Timestamp,
    pub processed: bool,
    pub processed_at: Option<Timestamp>,
    pub failure_reason: Option<String>,
    pub attempt_count: u32,
}

impl PaymentEvent {
    /// New, unprocessed entry.
    pub fn received(
        event_id: EventId,
        event_type: impl Into<String>,
        user_id: UserId,
        data: serde_json::Value,
        received_at: Timestamp,
    ) -> Self {
        Self {
            event_id,
            event_type: event_type.into(),
            user_id,
            data,
            received_at,
            processed: false,
            processed_at: None,
            failure_reason: None,
            attempt_count: 0,
        }
    }

    /// Parsed type of this entry; falls back to `Unknown` for unparsable strings.
    pub fn kind(&self) -> PaymentEventType {
        PaymentEventType::parse(&self.event_type)
            .unwrap_or_else(|_| PaymentEventType::Unknown(self.event_type.clone()))
    }

    /// Sets `processed`. Calling it again keeps the first `processed_at`.
    pub fn mark_processed(&mut self, now: Timestamp) {
        if !self.processed {
            self.processed = true;
            self.processed_at = Some(now);
        }
    }

    /// Records a failed attempt. `processed` is left as is.
    pub fn mark_failed(&mut self, reason: impl Into<String>) {
        self.failure_reason = Some(reason.into());
        self.attempt_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry() -> PaymentEvent {
        PaymentEvent::received(
            EventId::new("evt_1").unwrap(),
            "created",
            UserId::new("u1").unwrap(),
            json!({"plan": "premium"}),
            Timestamp::now(),
        )
    }

    #[test]
    fn parses_bare_and_namespaced_types() {
        assert_eq!(PaymentEventType::parse("created"), Ok(PaymentEventType::Created));
        assert_eq!(
            PaymentEventType::parse("subscription.cancelled"),
            Ok(PaymentEventType::Cancelled)
        );
        assert_eq!(
            PaymentEventType::parse("payment.failed"),
            Ok(PaymentEventType::PaymentFailed)
        );
    }

    #[test]
    fn unknown_type_is_preserved() {
        assert_eq!(
            PaymentEventType::parse("subscription.paused"),
            Ok(PaymentEventType::Unknown("subscription.paused".into()))
        );
    }

    #[test]
    fn empty_type_is_malformed() {
        assert!(PaymentEventType::parse("  ").is_err());
    }

    #[test]
    fn known_types_round_trip_through_canonical_spelling() {
        for kind in PaymentEventType::KNOWN {
            assert_eq!(PaymentEventType::parse(kind.as_str()), Ok(kind.clone()));
            assert!(kind.is_known());
        }
    }

    #[test]
    fn new_entry_is_unprocessed() {
        let e = entry();
        assert!(!e.processed);
        assert_eq!(e.attempt_count, 0);
        assert_eq!(e.kind(), PaymentEventType::Created);
    }

    #[test]
    fn failure_increments_attempts_without_processing() {
        let mut e = entry();
        e.mark_failed("db down");
        e.mark_failed("db still down");

        assert!(!e.processed);
        assert_eq!(e.attempt_count, 2);
        assert_eq!(e.failure_reason.as_deref(), Some("db still down"));
    }

    #[test]
    fn processed_is_permanent() {
        let mut e = entry();
        let first = Timestamp::now();
        e.mark_processed(first);
        e.mark_failed("late failure");
        e.mark_processed(first.plus_secs(10));

        assert!(e.processed);
        assert_eq!(e.processed_at, Some(first));
    }
}
