//! SubscriptionService - Single entry point for the billing core.
//!
//! Built once per process with its collaborators injected, then shared by
//! reference with the transport layer.

use std::sync::Arc;

use super::cancel_subscription::{CancelSubscriptionCommand, CancelSubscriptionHandler};
use super::create_checkout::{CreateCheckoutCommand, CreateCheckoutHandler};
use super::event_handlers::HandlerRegistry;
use super::get_subscription::{GetSubscriptionHandler, GetSubscriptionQuery, GetSubscriptionResult};
use super::process_payment_event::{
    EventDispatcher, ProcessPaymentEventCommand, ProcessPaymentEventResult, ReplaySummary,
};
use crate::domain::subscription::{SubscriptionError, SubscriptionRecord};
use crate::ports::{CacheInvalidator, CheckoutSession, EventLedger, GatewayClient, SubscriptionStore};

/// Shared collaborators of the subscription handlers.
#[derive(Clone)]
pub struct SubscriptionService {
    pub ledger: Arc<dyn EventLedger>,
    pub store: Arc<dyn SubscriptionStore>,
    pub gateway: Arc<dyn GatewayClient>,
    pub cache: Arc<dyn CacheInvalidator>,
    registry: HandlerRegistry,
}

impl SubscriptionService {
    /// Service with the standard event handler table.
    pub fn new(
        ledger: Arc<dyn EventLedger>,
        store: Arc<dyn SubscriptionStore>,
        gateway: Arc<dyn GatewayClient>,
        cache: Arc<dyn CacheInvalidator>,
    ) -> Self {
        let registry = HandlerRegistry::standard(store.clone(), cache.clone());
        Self {
            ledger,
            store,
            gateway,
            cache,
            registry,
        }
    }

    /// Replaces the event handler table.
    pub fn with_registry(mut self, registry: HandlerRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn event_dispatcher(&self) -> EventDispatcher {
        EventDispatcher::new(self.ledger.clone(), self.registry.clone())
    }

    pub fn get_subscription_handler(&self) -> GetSubscriptionHandler {
        GetSubscriptionHandler::new(self.store.clone())
    }

    pub fn create_checkout_handler(&self) -> CreateCheckoutHandler {
        CreateCheckoutHandler::new(self.store.clone(), self.gateway.clone())
    }

    pub fn cancel_subscription_handler(&self) -> CancelSubscriptionHandler {
        CancelSubscriptionHandler::new(
            self.store.clone(),
            self.gateway.clone(),
            self.cache.clone(),
        )
    }

    /// Ingests one gateway event delivery.
    pub async fn process_payment_event(
        &self,
        event_id: impl Into<String>,
        event_type: impl Into<String>,
        user_id: impl Into<String>,
        payload: serde_json::Value,
    ) -> Result<ProcessPaymentEventResult, SubscriptionError> {
        self.event_dispatcher()
            .handle(ProcessPaymentEventCommand {
                event_id: event_id.into(),
                event_type: event_type.into(),
                user_id: user_id.into(),
                payload,
            })
            .await
    }

    /// Re-runs unprocessed ledger rows, oldest first.
    pub async fn replay_unprocessed(&self, limit: u32) -> Result<ReplaySummary, SubscriptionError> {
        self.event_dispatcher().replay_unprocessed(limit).await
    }

    pub async fn get_user_subscription(
        &self,
        user_id: impl Into<String>,
    ) -> Result<GetSubscriptionResult, SubscriptionError> {
        self.get_subscription_handler()
            .handle(GetSubscriptionQuery {
                user_id: user_id.into(),
            })
            .await
    }

    pub async fn create_checkout(
        &self,
        user_id: impl Into<String>,
        plan: impl Into<String>,
        success_url: impl Into<String>,
        cancel_url: impl Into<String>,
    ) -> Result<CheckoutSession, SubscriptionError> {
        self.create_checkout_handler()
            .handle(CreateCheckoutCommand {
                user_id: user_id.into(),
                plan: plan.into(),
                success_url: success_url.into(),
                cancel_url: cancel_url.into(),
            })
            .await
    }

    pub async fn cancel_subscription(
        &self,
        user_id: impl Into<String>,
    ) -> Result<SubscriptionRecord, SubscriptionError> {
        self.cancel_subscription_handler()
            .handle(CancelSubscriptionCommand {
                user_id: user_id.into(),
            })
            .await
    }
}
