//! Typed view over the opaque event payload.
//!
//! The ledger stores the payload verbatim; handlers read it through
//! [`EventPayload`] so that missing or malformed fields surface as
//! validation errors instead of panics.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::{SubscriptionPlan, SubscriptionSnapshot, SubscriptionStatus};
use crate::domain::foundation::{Timestamp, ValidationError};

/// Fields the handlers understand. Anything else is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload {
    plan: Option<String>,
    status: Option<String>,
    current_period_end: Option<serde_json::Value>,
    provider: Option<String>,
    provider_ref: Option<String>,
    occurred_at: Option<serde_json::Value>,
}

impl EventPayload {
    /// Reads the payload. `null` is treated as an empty object.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, ValidationError> {
        match value {
            serde_json::Value::Null => Ok(Self::default()),
            serde_json::Value::Object(_) => serde_json::from_value(value.clone())
                .map_err(|e| ValidationError::invalid_format("payload", e.to_string())),
            _ => Err(ValidationError::invalid_format(
                "payload",
                "expected a JSON object",
            )),
        }
    }

    pub fn plan(&self) -> Result<Option<SubscriptionPlan>, ValidationError> {
        self.plan.as_deref().map(str::parse).transpose()
    }

    pub fn status(&self) -> Result<Option<SubscriptionStatus>, ValidationError> {
        self.status.as_deref().map(str::parse).transpose()
    }

    pub fn current_period_end(&self) -> Result<Option<Timestamp>, ValidationError> {
        parse_instant("currentPeriodEnd", self.current_period_end.as_ref())
    }

    /// Gateway time the event describes, used to detect reordering.
    pub fn occurred_at(&self) -> Result<Option<Timestamp>, ValidationError> {
        parse_instant("occurredAt", self.occurred_at.as_ref())
    }

    pub fn provider(&self) -> Option<&str> {
        non_empty(self.provider.as_deref())
    }

    pub fn provider_ref(&self) -> Option<&str> {
        non_empty(self.provider_ref.as_deref())
    }

    /// Full snapshot for `created`/`updated` events. Plan and status are required.
    pub fn to_snapshot(&self) -> Result<SubscriptionSnapshot, ValidationError> {
        let plan = self.plan()?.ok_or_else(|| ValidationError::empty_field("plan"))?;
        let status = self
            .status()?
            .ok_or_else(|| ValidationError::empty_field("status"))?;

        Ok(SubscriptionSnapshot {
            plan,
            status,
            current_period_end: self.current_period_end()?,
            provider: self.provider().map(str::to_string),
            provider_ref: self.provider_ref().map(str::to_string),
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Accepts RFC 3339 strings and Unix seconds.
fn parse_instant(
    field: &str,
    value: Option<&serde_json::Value>,
) -> Result<Option<Timestamp>, ValidationError> {
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Timestamp::parse_rfc3339(s)
            .map(Some)
            .map_err(|e| ValidationError::invalid_format(field, e.to_string())),
        Some(serde_json::Value::Number(n)) => n
            .as_i64()
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
            .map(|dt| Some(Timestamp::from_datetime(dt)))
            .ok_or_else(|| ValidationError::invalid_format(field, "invalid unix timestamp")),
        Some(other) => Err(ValidationError::invalid_format(
            field,
            format!("unsupported value {}", other),
        )),
    }
}
