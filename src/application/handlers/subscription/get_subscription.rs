//! GetSubscriptionHandler - Query handler for a user's subscription.

use std::sync::Arc;

use crate::domain::foundation::{Timestamp, UserId};
use crate::domain::subscription::{SubscriptionError, SubscriptionPlan, SubscriptionRecord};
use crate::ports::SubscriptionStore;

/// Query for a user's subscription.
#[derive(Debug, Clone)]
pub struct GetSubscriptionQuery {
    pub user_id: String,
}

/// Read-only projection of the stored record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetSubscriptionResult {
    pub subscription: SubscriptionRecord,

    /// Plan whose entitlements apply right now (grace period aware).
    pub effective_plan: SubscriptionPlan,
}

pub struct GetSubscriptionHandler {
    store: Arc<dyn SubscriptionStore>,
}

impl GetSubscriptionHandler {
    pub fn new(store: Arc<dyn SubscriptionStore>) -> Self {
        Self { store }
    }

    pub async fn handle(
        &self,
        query: GetSubscriptionQuery,
    ) -> Result<GetSubscriptionResult, SubscriptionError> {
        let user_id = UserId::new(query.user_id)?;
        let subscription = self.store.get(&user_id).await?;
        let effective_plan = subscription.effective_plan(Timestamp::now());

        Ok(GetSubscriptionResult {
            subscription,
            effective_plan,
        })
    }
}
