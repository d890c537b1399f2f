//! Mock gateway client for testing.
//!
//! Configurable stand-in for the payment microservice. Supports:
//! - Pre-configured checkout sessions
//! - Error injection, globally or per method
//! - Call tracking for "never invoked" assertions

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::domain::foundation::UserId;
use crate::ports::{CancelAck, CheckoutRequest, CheckoutSession, GatewayClient, GatewayError};

/// Method name recorded for `create_checkout_session`.
pub const CHECKOUT_METHOD: &str = "create_checkout_session";
/// Method name recorded for `cancel_subscription`.
pub const CANCEL_METHOD: &str = "cancel_subscription";

/// Mock gateway client.
///
/// # Example
///
/// ```ignore
/// let gateway = MockGatewayClient::new();
/// gateway.set_method_error(CHECKOUT_METHOD, GatewayError::timeout("slow"));
/// // ... exercise the service ...
/// assert_eq!(gateway.call_count(CANCEL_METHOD), 0);
/// ```
#[derive(Default, Clone)]
pub struct MockGatewayClient {
    inner: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    next_checkout: Option<CheckoutSession>,
    next_error: Option<GatewayError>,
    method_errors: HashMap<String, GatewayError>,
    call_log: Vec<GatewayCall>,
}

/// Recorded call for assertions.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayCall {
    pub method: String,
    pub args: Vec<String>,
}

impl MockGatewayClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session returned by the next `create_checkout_session` call.
    pub fn set_checkout_session(&self, session: CheckoutSession) {
        self.state().next_checkout = Some(session);
    }

    /// Error returned by the next call of any method.
    pub fn set_error(&self, error: GatewayError) {
        self.state().next_error = Some(error);
    }

    /// Error returned by every call of `method` until cleared.
    pub fn set_method_error(&self, method: &str, error: GatewayError) {
        self.state().method_errors.insert(method.to_string(), error);
    }

    pub fn clear_errors(&self) {
        let mut state = self.state();
        state.next_error = None;
        state.method_errors.clear();
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.state().call_log.clone()
    }

    pub fn was_called(&self, method: &str) -> bool {
        self.call_count(method) > 0
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.state()
            .call_log
            .iter()
            .filter(|c| c.method == method)
            .count()
    }

    pub fn clear_calls(&self) {
        self.state().call_log.clear();
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        // A poisoned lock only means another test thread panicked.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record_call(&self, method: &str, args: Vec<String>) {
        self.state().call_log.push(GatewayCall {
            method: method.to_string(),
            args,
        });
    }

    fn check_error(&self, method: &str) -> Result<(), GatewayError> {
        let mut state = self.state();
        if let Some(err) = state.next_error.take() {
            return Err(err);
        }
        if let Some(err) = state.method_errors.get(method) {
            return Err(err.clone());
        }
        Ok(())
    }
}

#[async_trait]
impl GatewayClient for MockGatewayClient {
    async fn create_checkout_session(
        &self,
        request: CheckoutRequest,
    ) -> Result<CheckoutSession, GatewayError> {
        self.record_call(
            CHECKOUT_METHOD,
            vec![
                request.user_id.to_string(),
                request.email.clone(),
                request.plan.to_string(),
            ],
        );
        self.check_error(CHECKOUT_METHOD)?;

        let configured = self.state().next_checkout.take();
        Ok(configured.unwrap_or_else(|| CheckoutSession {
            session_id: format!("cs_mock_{}", request.user_id),
            redirect_url: format!("https://pay.example.test/checkout/{}", request.plan),
        }))
    }

    async fn cancel_subscription(
        &self,
        user_id: &UserId,
        provider_ref: &str,
    ) -> Result<CancelAck, GatewayError> {
        self.record_call(
            CANCEL_METHOD,
            vec![user_id.to_string(), provider_ref.to_string()],
        );
        self.check_error(CANCEL_METHOD)?;

        Ok(CancelAck {
            status: Some("cancelled".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::subscription::SubscriptionPlan;

    fn request() -> CheckoutRequest {
        CheckoutRequest {
            user_id: UserId::new("u1").unwrap(),
            email: "u1@example.com".into(),
            plan: SubscriptionPlan::Premium,
            success_url: "https://app.example.test/ok".into(),
            cancel_url: "https://app.example.test/cancel".into(),
        }
    }

    #[tokio::test]
    async fn checkout_returns_configured_session() {
        let mock = MockGatewayClient::new();
        mock.set_checkout_session(CheckoutSession {
            session_id: "cs_1".into(),
            redirect_url: "https://pay/1".into(),
        });

        let session = mock.create_checkout_session(request()).await.unwrap();

        assert_eq!(session.session_id, "cs_1");
    }

    #[tokio::test]
    async fn method_error_only_affects_that_method() {
        let mock = MockGatewayClient::new();
        mock.set_method_error(CHECKOUT_METHOD, GatewayError::timeout("slow"));

        assert!(mock.create_checkout_session(request()).await.is_err());
        assert!(mock
            .cancel_subscription(&UserId::new("u1").unwrap(), "r1")
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn next_error_is_consumed_once() {
        let mock = MockGatewayClient::new();
        mock.set_error(GatewayError::transport("reset"));

        assert!(mock.create_checkout_session(request()).await.is_err());
        assert!(mock.create_checkout_session(request()).await.is_ok());
    }

    #[tokio::test]
    async fn tracks_calls_with_arguments() {
        let mock = MockGatewayClient::new();
        mock.cancel_subscription(&UserId::new("u7").unwrap(), "r7")
            .await
            .unwrap();

        assert!(mock.was_called(CANCEL_METHOD));
        assert_eq!(mock.call_count(CHECKOUT_METHOD), 0);
        assert_eq!(mock.calls()[0].args, vec!["u7".to_string(), "r7".to_string()]);

        mock.clear_calls();
        assert!(mock.calls().is_empty());
    }
}
