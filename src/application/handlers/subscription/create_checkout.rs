//! CreateCheckoutHandler - Starts a hosted checkout for a paid plan.
//!
//! The subscription record is not touched here. Activation arrives later as
//! a `created` event from the gateway.

use std::sync::Arc;

use crate::domain::foundation::UserId;
use crate::domain::subscription::{SubscriptionError, SubscriptionPlan};
use crate::ports::{CheckoutRequest, CheckoutSession, GatewayClient, SubscriptionStore};

/// Command to start checkout.
#[derive(Debug, Clone)]
pub struct CreateCheckoutCommand {
    pub user_id: String,
    /// Raw plan name as requested by the client.
    pub plan: String,
    pub success_url: String,
    pub cancel_url: String,
}

pub struct CreateCheckoutHandler {
    store: Arc<dyn SubscriptionStore>,
    gateway: Arc<dyn GatewayClient>,
}

impl CreateCheckoutHandler {
    pub fn new(store: Arc<dyn SubscriptionStore>, gateway: Arc<dyn GatewayClient>) -> Self {
        Self { store, gateway }
    }

    pub async fn handle(
        &self,
        cmd: CreateCheckoutCommand,
    ) -> Result<CheckoutSession, SubscriptionError> {
        let user_id = UserId::new(cmd.user_id)?;

        // 1. Only paid plans can be purchased
        let plan = parse_purchasable_plan(&cmd.plan)?;
        require_url("successUrl", &cmd.success_url)?;
        require_url("cancelUrl", &cmd.cancel_url)?;

        // 2. Email for prefill; also proves the user exists
        let email = self
            .store
            .find_email(&user_id)
            .await?
            .ok_or_else(|| SubscriptionError::not_found(user_id.as_str()))?;

        // 3. Ask the gateway
        let session = self
            .gateway
            .create_checkout_session(CheckoutRequest {
                user_id: user_id.clone(),
                email,
                plan,
                success_url: cmd.success_url,
                cancel_url: cmd.cancel_url,
            })
            .await
            .map_err(|e| {
                tracing::warn!(
                    user_id = %user_id,
                    plan = %plan,
                    kind = %e.kind,
                    status = ?e.status,
                    "Checkout session creation failed"
                );
                SubscriptionError::from(e)
            })?;

        tracing::info!(
            user_id = %user_id,
            plan = %plan,
            session_id = %session.session_id,
            "Checkout session created"
        );

        Ok(session)
    }
}

fn parse_purchasable_plan(raw: &str) -> Result<SubscriptionPlan, SubscriptionError> {
    match raw.parse::<SubscriptionPlan>() {
        Ok(plan) if plan.is_purchasable() => Ok(plan),
        _ => Err(SubscriptionError::invalid_plan(raw)),
    }
}

fn require_url(field: &str, value: &str) -> Result<(), SubscriptionError> {
    if value.trim().is_empty() {
        return Err(SubscriptionError::validation(field, "URL is required"));
    }
    Ok(())
}
