//! Per-user subscription mirror.
//!
//! A `SubscriptionRecord` is embedded in the user entity. It is never deleted,
//! only transitioned, and every mutation goes through the methods below so the
//! record invariants hold after each write:
//!
//! - `provider_ref` is present only if `provider` is present.
//! - A free plan is either `active` or `inactive`.

use serde::{Deserialize, Serialize};

use super::{SubscriptionError, SubscriptionPlan, SubscriptionStatus};
use crate::domain::foundation::{StateMachine, Timestamp, ValidationError};

/// Gateway-reported state used for full-replace updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionSnapshot {
    pub plan: SubscriptionPlan,
    pub status: SubscriptionStatus,
    pub current_period_end: Option<Timestamp>,
    pub provider: Option<String>,
    pub provider_ref: Option<String>,
}

/// Local mirror of a user's subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    pub plan: SubscriptionPlan,
    pub status: SubscriptionStatus,
    pub current_period_end: Option<Timestamp>,
    pub provider: Option<String>,
    pub provider_ref: Option<String>,
    pub updated_at: Timestamp,

    /// Newest gateway `occurredAt` applied to this record.
    pub last_event_at: Option<Timestamp>,
}

impl SubscriptionRecord {
    /// Record of a freshly created user with no subscription.
    pub fn inactive(now: Timestamp) -> Self {
        Self {
            plan: SubscriptionPlan::Free,
            status: SubscriptionStatus::Inactive,
            current_period_end: None,
            provider: None,
            provider_ref: None,
            updated_at: now,
            last_event_at: None,
        }
    }

    /// Record of a user defaulted onto the free plan.
    pub fn free_active(now: Timestamp) -> Self {
        Self {
            status: SubscriptionStatus::Active,
            ..Self::inactive(now)
        }
    }

    /// Checks the record invariants.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.provider_ref.is_some() && self.provider.is_none() {
            return Err(ValidationError::invalid_format(
                "providerRef",
                "a provider reference requires a provider",
            ));
        }
        if self.plan == SubscriptionPlan::Free && self.provider.is_some() {
            return Err(ValidationError::invalid_format(
                "provider",
                "free plan has no billing provider",
            ));
        }
        if self.plan == SubscriptionPlan::Free && !self.status.allowed_on_free_plan() {
            return Err(ValidationError::invalid_format(
                "status",
                format!("free plan cannot be {}", self.status),
            ));
        }
        Ok(())
    }

    /// Replaces every gateway-owned field with the snapshot.
    ///
    /// On validation failure the record is left untouched.
    pub fn apply_snapshot(
        &mut self,
        snapshot: SubscriptionSnapshot,
        now: Timestamp,
    ) -> Result<(), SubscriptionError> {
        let next = SubscriptionRecord {
            plan: snapshot.plan,
            status: snapshot.status,
            current_period_end: snapshot.current_period_end,
            provider: snapshot.provider,
            provider_ref: snapshot.provider_ref,
            updated_at: now,
            last_event_at: self.last_event_at,
        };
        next.validate()?;
        *self = next;
        Ok(())
    }

    /// Marks the subscription active again, optionally moving plan and period end.
    pub fn renew(
        &mut self,
        plan: Option<SubscriptionPlan>,
        current_period_end: Option<Timestamp>,
        now: Timestamp,
    ) -> Result<(), SubscriptionError> {
        let status = self.status.transition_to(SubscriptionStatus::Active)?;
        let mut next = self.clone();
        next.status = status;
        if let Some(plan) = plan {
            next.plan = plan;
        }
        if current_period_end.is_some() {
            next.current_period_end = current_period_end;
        }
        next.updated_at = now;
        next.validate()?;
        *self = next;
        Ok(())
    }

    /// Stops billing while keeping plan and provider reference (grace period).
    pub fn cancel(
        &mut self,
        current_period_end: Option<Timestamp>,
        now: Timestamp,
    ) -> Result<(), SubscriptionError> {
        if !self.plan.is_paid() {
            return Err(SubscriptionError::invalid_state(
                self.status.as_str(),
                "cancel a free plan",
            ));
        }
        let status = self.status.transition_to(SubscriptionStatus::Cancelled)?;
        self.status = status;
        if current_period_end.is_some() {
            self.current_period_end = current_period_end;
        }
        self.updated_at = now;
        Ok(())
    }

    /// True if a gateway event from `occurred_at` predates what was already applied.
    pub fn is_stale(&self, occurred_at: Option<Timestamp>) -> bool {
        match (occurred_at, self.last_event_at) {
            (Some(occurred), Some(last)) => occurred.is_before(&last),
            _ => false,
        }
    }

    /// Advances `last_event_at` to `occurred_at` if it is newer.
    pub fn observe_event(&mut self, occurred_at: Option<Timestamp>) {
        if let Some(occurred) = occurred_at {
            if self.last_event_at.map_or(true, |last| occurred.is_after(&last)) {
                self.last_event_at = Some(occurred);
            }
        }
    }

    /// Plan whose entitlements apply at `now`.
    ///
    /// Cancelled and past-due subscriptions keep their plan until the period
    /// ends; after that the user falls back to free.
    pub fn effective_plan(&self, now: Timestamp) -> SubscriptionPlan {
        match self.status {
            SubscriptionStatus::Active => self.plan,
            SubscriptionStatus::Inactive => SubscriptionPlan::Free,
            SubscriptionStatus::Cancelled | SubscriptionStatus::PastDue => {
                match self.current_period_end {
                    Some(end) if now.is_before(&end) => self.plan,
                    _ => SubscriptionPlan::Free,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::subscription::ErrorKind;

    fn premium_active(now: Timestamp) -> SubscriptionRecord {
        SubscriptionRecord {
            plan: SubscriptionPlan::Premium,
            status: SubscriptionStatus::Active,
            current_period_end: Some(now.add_days(30)),
            provider: Some("gateway".into()),
            provider_ref: Some("sub_1".into()),
            updated_at: now,
            last_event_at: None,
        }
    }

    fn snapshot(plan: SubscriptionPlan, status: SubscriptionStatus) -> SubscriptionSnapshot {
        SubscriptionSnapshot {
            plan,
            status,
            current_period_end: None,
            provider: Some("gateway".into()),
            provider_ref: Some("sub_9".into()),
        }
    }

    #[test]
    fn new_user_is_inactive_free() {
        let record = SubscriptionRecord::inactive(Timestamp::now());
        assert_eq!(record.plan, SubscriptionPlan::Free);
        assert_eq!(record.status, SubscriptionStatus::Inactive);
        assert!(record.validate().is_ok());
    }

    #[test]
    fn provider_ref_without_provider_is_invalid() {
        let mut record = SubscriptionRecord::inactive(Timestamp::now());
        record.provider_ref = Some("sub_1".into());
        assert_eq!(record.validate().unwrap_err().field(), "providerRef");
    }

    #[test]
    fn free_plan_with_provider_is_invalid() {
        let mut record = SubscriptionRecord::free_active(Timestamp::now());
        record.provider = Some("gw".into());
        record.provider_ref = Some("r1".into());
        assert_eq!(record.validate().unwrap_err().field(), "provider");
    }

    #[test]
    fn free_snapshot_with_provider_is_rejected() {
        let now = Timestamp::now();
        let mut record = SubscriptionRecord::inactive(now);
        let before = record.clone();

        let err = record
            .apply_snapshot(snapshot(SubscriptionPlan::Free, SubscriptionStatus::Active), now)
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(record, before);
    }

    #[test]
    fn snapshot_replaces_all_gateway_fields() {
        let now = Timestamp::now();
        let mut record = SubscriptionRecord::inactive(now);

        record
            .apply_snapshot(snapshot(SubscriptionPlan::Family, SubscriptionStatus::Active), now)
            .unwrap();

        assert_eq!(record.plan, SubscriptionPlan::Family);
        assert_eq!(record.status, SubscriptionStatus::Active);
        assert_eq!(record.provider.as_deref(), Some("gateway"));
        assert_eq!(record.provider_ref.as_deref(), Some("sub_9"));
        assert_eq!(record.current_period_end, None);
    }

    #[test]
    fn invalid_snapshot_leaves_record_untouched() {
        let now = Timestamp::now();
        let mut record = premium_active(now);
        let before = record.clone();

        let err = record
            .apply_snapshot(snapshot(SubscriptionPlan::Free, SubscriptionStatus::Cancelled), now)
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(record, before);
    }

    #[test]
    fn cancel_keeps_plan_and_provider_ref() {
        let now = Timestamp::now();
        let mut record = premium_active(now);

        record.cancel(None, now).unwrap();

        assert_eq!(record.status, SubscriptionStatus::Cancelled);
        assert_eq!(record.plan, SubscriptionPlan::Premium);
        assert_eq!(record.provider_ref.as_deref(), Some("sub_1"));
    }

    #[test]
    fn cancel_on_free_plan_is_invalid_state() {
        let now = Timestamp::now();
        let mut record = SubscriptionRecord::free_active(now);
        let err = record.cancel(None, now).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn cancel_on_inactive_paid_record_is_invalid_state() {
        let now = Timestamp::now();
        let mut record = premium_active(now);
        record.status = SubscriptionStatus::Inactive;
        let err = record.cancel(None, now).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn renew_reactivates_cancelled_and_moves_period() {
        let now = Timestamp::now();
        let mut record = premium_active(now);
        record.cancel(None, now).unwrap();
        let new_end = now.add_days(60);

        record.renew(Some(SubscriptionPlan::Family), Some(new_end), now).unwrap();

        assert_eq!(record.status, SubscriptionStatus::Active);
        assert_eq!(record.plan, SubscriptionPlan::Family);
        assert_eq!(record.current_period_end, Some(new_end));
    }

    #[test]
    fn renew_without_fields_keeps_existing_values() {
        let now = Timestamp::now();
        let mut record = premium_active(now);
        let end = record.current_period_end;

        record.renew(None, None, now).unwrap();

        assert_eq!(record.plan, SubscriptionPlan::Premium);
        assert_eq!(record.current_period_end, end);
    }

    #[test]
    fn stale_only_when_strictly_older() {
        let now = Timestamp::now();
        let mut record = premium_active(now);
        assert!(!record.is_stale(Some(now)));

        record.observe_event(Some(now));
        assert!(record.is_stale(Some(now.plus_secs(-1))));
        assert!(!record.is_stale(Some(now)));
        assert!(!record.is_stale(None));
    }

    #[test]
    fn observe_event_never_moves_backwards() {
        let now = Timestamp::now();
        let mut record = premium_active(now);
        record.observe_event(Some(now));
        record.observe_event(Some(now.plus_secs(-60)));
        assert_eq!(record.last_event_at, Some(now));
    }

    #[test]
    fn cancelled_plan_is_effective_until_period_end() {
        let now = Timestamp::now();
        let mut record = premium_active(now);
        record.cancel(None, now).unwrap();

        assert_eq!(record.effective_plan(now), SubscriptionPlan::Premium);
        assert_eq!(record.effective_plan(now.add_days(31)), SubscriptionPlan::Free);
    }
}
