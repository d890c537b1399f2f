//! Subscription plan definitions.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// Subscription plan of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionPlan {
    /// No billing relationship. Never carries a provider reference.
    Free,

    /// Single-viewer paid plan.
    Premium,

    /// Paid plan shared by the household's kid profiles.
    Family,
}

impl SubscriptionPlan {
    /// Returns true if this plan is billed through the gateway.
    pub fn is_paid(&self) -> bool {
        !matches!(self, SubscriptionPlan::Free)
    }

    /// Plans a user may start a checkout for.
    pub fn is_purchasable(&self) -> bool {
        self.is_paid()
    }

    /// Wire and storage spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionPlan::Free => "free",
            SubscriptionPlan::Premium => "premium",
            SubscriptionPlan::Family => "family",
        }
    }
}

impl FromStr for SubscriptionPlan {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "free" => Ok(SubscriptionPlan::Free),
            "premium" => Ok(SubscriptionPlan::Premium),
            "family" => Ok(SubscriptionPlan::Family),
            "" => Err(ValidationError::empty_field("plan")),
            _ => Err(ValidationError::unsupported_value("plan", s)),
        }
    }
}

impl std::fmt::Display for SubscriptionPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
