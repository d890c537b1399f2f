//! GatewayClient port - Outbound calls to the payment microservice.
//!
//! This is the only network boundary of the billing core. Both calls are
//! synchronous from the caller's point of view and bounded by a timeout.
//! Every failure (transport, timeout, non-2xx, unreadable body) is reported
//! as a [`GatewayError`]; callers never see raw transport errors.
//!
//! No retries happen behind this port.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::UserId;
use crate::domain::subscription::{SubscriptionError, SubscriptionPlan};

#[async_trait]
pub trait GatewayClient: Send + Sync {
    /// Starts a hosted checkout for a paid plan.
    async fn create_checkout_session(
        &self,
        request: CheckoutRequest,
    ) -> Result<CheckoutSession, GatewayError>;

    /// Stops billing for the external subscription `provider_ref`.
    async fn cancel_subscription(
        &self,
        user_id: &UserId,
        provider_ref: &str,
    ) -> Result<CancelAck, GatewayError>;
}

/// Request to create a checkout session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub user_id: UserId,

    /// Customer email for prefill.
    pub email: String,

    pub plan: SubscriptionPlan,

    /// Where the gateway sends the user after paying.
    pub success_url: String,

    /// Where the gateway sends the user after abandoning checkout.
    pub cancel_url: String,
}

/// Checkout session created by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub session_id: String,
    pub redirect_url: String,
}

/// Gateway acknowledgement of a cancellation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CancelAck {
    /// Gateway-side status string, if one was returned.
    pub status: Option<String>,
}

/// Failure category of a gateway call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayErrorKind {
    /// No response before the deadline.
    Timeout,
    /// Connection could not be made or was dropped.
    Transport,
    /// Gateway answered with a non-2xx status.
    UpstreamStatus,
    /// 2xx response whose body could not be understood.
    InvalidResponse,
}

impl std::fmt::Display for GatewayErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            GatewayErrorKind::Timeout => "TIMEOUT",
            GatewayErrorKind::Transport => "TRANSPORT",
            GatewayErrorKind::UpstreamStatus => "UPSTREAM_STATUS",
            GatewayErrorKind::InvalidResponse => "INVALID_RESPONSE",
        };
        write!(f, "{}", s)
    }
}

/// Error from a gateway call, carrying upstream status and body for logging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayError {
    pub kind: GatewayErrorKind,
    pub status: Option<u16>,
    pub body: Option<String>,
    pub message: String,
}

impl GatewayError {
    pub fn new(kind: GatewayErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            body: None,
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorKind::Timeout, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorKind::Transport, message)
    }

    /// Non-2xx response.
    pub fn upstream(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        Self {
            kind: GatewayErrorKind::UpstreamStatus,
            status: Some(status),
            message: format!("gateway responded with status {}", status),
            body: Some(body),
        }
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorKind::InvalidResponse, message)
    }

    pub fn is_timeout(&self) -> bool {
        self.kind == GatewayErrorKind::Timeout
    }
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for GatewayError {}

impl From<GatewayError> for SubscriptionError {
    fn from(err: GatewayError) -> Self {
        SubscriptionError::Gateway {
            timed_out: err.is_timeout(),
            status: err.status,
            message: err.body.filter(|b| !b.is_empty()).unwrap_or(err.message),
        }
    }
}
