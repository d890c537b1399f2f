//! Subscription status state machine.
//!
//! The gateway owns the real billing lifecycle; this enum is the local mirror.
//! Transitions below govern the incremental updates (renewal, cancellation).
//! Full snapshots from `created`/`updated` events are authoritative and do not
//! consult the graph.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::domain::foundation::{StateMachine, ValidationError};

/// Subscription status of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Billing is current.
    Active,

    /// No subscription yet.
    Inactive,

    /// Billing stopped. Entitlement lasts until the period end.
    Cancelled,

    /// The gateway reported a failed renewal and is retrying.
    PastDue,
}

impl SubscriptionStatus {
    /// Wire and storage spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Inactive => "inactive",
            SubscriptionStatus::Cancelled => "cancelled",
            SubscriptionStatus::PastDue => "past_due",
        }
    }

    /// Statuses allowed for a free plan, which has no billing lifecycle.
    pub fn allowed_on_free_plan(&self) -> bool {
        matches!(self, SubscriptionStatus::Active | SubscriptionStatus::Inactive)
    }
}

impl FromStr for SubscriptionStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(SubscriptionStatus::Active),
            "inactive" => Ok(SubscriptionStatus::Inactive),
            "cancelled" | "canceled" => Ok(SubscriptionStatus::Cancelled),
            "past_due" => Ok(SubscriptionStatus::PastDue),
            "" => Err(ValidationError::empty_field("status")),
            _ => Err(ValidationError::unsupported_value("status", s)),
        }
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl StateMachine for SubscriptionStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use SubscriptionStatus::*;
        matches!(
            (self, target),
            (Inactive, Active)
                | (Active, Active) // Renewal
                | (Active, Cancelled)
                | (Active, PastDue)
                | (PastDue, Active)
                | (PastDue, Cancelled)
                | (Cancelled, Active) // Resubscription
                | (Cancelled, Cancelled) // Repeated cancellation notice
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use SubscriptionStatus::*;
        match self {
            Inactive => vec![Active],
            Active => vec![Active, Cancelled, PastDue],
            PastDue => vec![Active, Cancelled],
            Cancelled => vec![Active, Cancelled],
        }
    }
}
