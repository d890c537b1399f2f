//! CancelSubscriptionHandler - Direct, user-initiated cancellation.
//!
//! This is a synchronous operation, not an event: nothing is written to the
//! ledger. After the gateway acknowledges, the local record is set to
//! `cancelled` ahead of the confirming event so reads reflect it at once.

use std::sync::Arc;

use crate::domain::foundation::{Timestamp, UserId};
use crate::domain::subscription::{SubscriptionError, SubscriptionRecord, SubscriptionStatus};
use crate::ports::{CacheInvalidator, GatewayClient, SubscriptionStore};

/// Command to cancel a user's subscription.
#[derive(Debug, Clone)]
pub struct CancelSubscriptionCommand {
    pub user_id: String,
}

pub struct CancelSubscriptionHandler {
    store: Arc<dyn SubscriptionStore>,
    gateway: Arc<dyn GatewayClient>,
    cache: Arc<dyn CacheInvalidator>,
}

impl CancelSubscriptionHandler {
    pub fn new(
        store: Arc<dyn SubscriptionStore>,
        gateway: Arc<dyn GatewayClient>,
        cache: Arc<dyn CacheInvalidator>,
    ) -> Self {
        Self {
            store,
            gateway,
            cache,
        }
    }

    pub async fn handle(
        &self,
        cmd: CancelSubscriptionCommand,
    ) -> Result<SubscriptionRecord, SubscriptionError> {
        let user_id = UserId::new(cmd.user_id)?;

        // 1. Preconditions, checked before any side effect
        let mut record = self.store.get(&user_id).await?;
        if record.status != SubscriptionStatus::Active {
            return Err(SubscriptionError::invalid_state(
                record.status.as_str(),
                "cancel",
            ));
        }
        if !record.plan.is_paid() {
            return Err(SubscriptionError::invalid_state(
                format!("{} on {} plan", record.status, record.plan),
                "cancel",
            ));
        }
        let provider_ref = record.provider_ref.clone().ok_or_else(|| {
            SubscriptionError::invalid_state(
                format!("{} without provider reference", record.status),
                "cancel",
            )
        })?;

        // 2. Gateway call; nothing local changes if it fails
        self.gateway
            .cancel_subscription(&user_id, &provider_ref)
            .await
            .map_err(|e| {
                tracing::warn!(
                    user_id = %user_id,
                    provider_ref = %provider_ref,
                    kind = %e.kind,
                    status = ?e.status,
                    "Gateway cancellation failed"
                );
                SubscriptionError::from(e)
            })?;

        // 3. Optimistic local update
        record.cancel(None, Timestamp::now())?;
        self.store.update_subscription(&user_id, &record).await?;
        self.cache.invalidate_user(&user_id).await?;

        tracing::info!(
            user_id = %user_id,
            provider_ref = %provider_ref,
            "Subscription cancelled ahead of gateway confirmation"
        );

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::gateway::{MockGatewayClient, CANCEL_METHOD};
    use crate::adapters::memory::{InMemorySubscriptionStore, RecordingCacheInvalidator};
    use crate::domain::subscription::{ErrorKind, SubscriptionPlan};
    use crate::ports::GatewayError;

    struct Fixture {
        store: Arc<InMemorySubscriptionStore>,
        gateway: Arc<MockGatewayClient>,
        cache: Arc<RecordingCacheInvalidator>,
        handler: CancelSubscriptionHandler,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemorySubscriptionStore::new());
        let gateway = Arc::new(MockGatewayClient::new());
        let cache = Arc::new(RecordingCacheInvalidator::new());
        let handler = CancelSubscriptionHandler::new(store.clone(), gateway.clone(), cache.clone());
        Fixture {
            store,
            gateway,
            cache,
            handler,
        }
    }

    fn premium_active() -> SubscriptionRecord {
        let now = Timestamp::now();
        SubscriptionRecord {
            plan: SubscriptionPlan::Premium,
            status: SubscriptionStatus::Active,
            current_period_end: Some(now.add_days(30)),
            provider: Some("gw".into()),
            provider_ref: Some("r1".into()),
            updated_at: now,
            last_event_at: None,
        }
    }

    fn cmd(user_id: &str) -> CancelSubscriptionCommand {
        CancelSubscriptionCommand {
            user_id: user_id.into(),
        }
    }

    #[tokio::test]
    async fn active_subscription_is_cancelled_optimistically() {
        let f = fixture();
        let u1 = UserId::new("u1").unwrap();
        f.store.insert_user(&u1, "u1@example.com", premium_active());

        let record = f.handler.handle(cmd("u1")).await.unwrap();

        assert_eq!(record.status, SubscriptionStatus::Cancelled);
        assert_eq!(record.plan, SubscriptionPlan::Premium);
        assert_eq!(f.store.record(&u1).unwrap(), record);
        assert_eq!(f.gateway.calls()[0].args, vec!["u1".to_string(), "r1".to_string()]);
        assert_eq!(f.cache.invalidations(), vec!["user:u1".to_string()]);
    }

    #[tokio::test]
    async fn non_active_subscription_never_reaches_gateway() {
        for status in [
            SubscriptionStatus::Inactive,
            SubscriptionStatus::Cancelled,
            SubscriptionStatus::PastDue,
        ] {
            let f = fixture();
            let u2 = UserId::new("u2").unwrap();
            let mut record = premium_active();
            record.status = status;
            f.store.insert_user(&u2, "u2@example.com", record.clone());

            let err = f.handler.handle(cmd("u2")).await.unwrap_err();

            assert_eq!(err.kind(), ErrorKind::InvalidState);
            assert!(!f.gateway.was_called(CANCEL_METHOD));
            assert_eq!(f.store.record(&u2).unwrap(), record);
            assert!(f.cache.invalidations().is_empty());
        }
    }

    #[tokio::test]
    async fn active_free_plan_without_reference_is_invalid_state() {
        let f = fixture();
        let u1 = UserId::new("u1").unwrap();
        f.store.insert_user(&u1, "u1@example.com", SubscriptionRecord::free_active(Timestamp::now()));

        let err = f.handler.handle(cmd("u1")).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert!(!f.gateway.was_called(CANCEL_METHOD));
    }

    #[tokio::test]
    async fn free_plan_with_stray_reference_never_reaches_gateway() {
        let f = fixture();
        let u1 = UserId::new("u1").unwrap();
        let mut record = SubscriptionRecord::free_active(Timestamp::now());
        record.provider = Some("gw".into());
        record.provider_ref = Some("r1".into());
        f.store.insert_user(&u1, "u1@example.com", record.clone());

        let err = f.handler.handle(cmd("u1")).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert!(!f.gateway.was_called(CANCEL_METHOD));
        assert_eq!(f.store.record(&u1).unwrap(), record);
        assert!(f.cache.invalidations().is_empty());
    }

    #[tokio::test]
    async fn gateway_failure_leaves_record_active() {
        let f = fixture();
        let u1 = UserId::new("u1").unwrap();
        f.store.insert_user(&u1, "u1@example.com", premium_active());
        f.gateway
            .set_method_error(CANCEL_METHOD, GatewayError::upstream(502, "bad gateway"));

        let err = f.handler.handle(cmd("u1")).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Gateway);
        assert_eq!(f.store.record(&u1).unwrap().status, SubscriptionStatus::Active);
        assert!(f.cache.invalidations().is_empty());
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let f = fixture();
        let err = f.handler.handle(cmd("ghost")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
