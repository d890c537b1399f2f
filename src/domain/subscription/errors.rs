//! Subscription-specific error types.
//!
//! Every failure surfaced by the billing core is a [`SubscriptionError`]. The
//! HTTP boundary picks a transport status from [`SubscriptionError::kind`]
//! (or the ready-made [`SubscriptionError::http_status`]).
//!
//! # HTTP Status Mapping
//!
//! | Kind | HTTP Status | Retryable |
//! |------|-------------|-----------|
//! | Validation (incl. invalid plan) | 400 | no |
//! | NotFound | 404 | no |
//! | InvalidState | 409 | no |
//! | Gateway | 502 (504 on timeout) | yes |
//! | Persistence | 500 | yes |

use crate::domain::foundation::{DomainError, ErrorCode, InvalidTransition, ValidationError};

/// Error-kind discriminator consumed by the transport layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    NotFound,
    InvalidState,
    Gateway,
    Persistence,
}

/// Subscription-specific errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// Input failed validation (malformed payload, bad event type, ...).
    Validation { field: String, message: String },

    /// Requested plan cannot be purchased.
    InvalidPlan(String),

    /// No user with this id.
    NotFound { user_id: String },

    /// Operation not allowed in the record's current state.
    InvalidState { current: String, attempted: String },

    /// Payment gateway failed or timed out.
    Gateway {
        timed_out: bool,
        status: Option<u16>,
        message: String,
    },

    /// Ledger, store or cache write failed.
    Persistence(String),
}

impl SubscriptionError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        SubscriptionError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn invalid_plan(plan: impl Into<String>) -> Self {
        SubscriptionError::InvalidPlan(plan.into())
    }

    pub fn not_found(user_id: impl Into<String>) -> Self {
        SubscriptionError::NotFound {
            user_id: user_id.into(),
        }
    }

    pub fn invalid_state(current: impl Into<String>, attempted: impl Into<String>) -> Self {
        SubscriptionError::InvalidState {
            current: current.into(),
            attempted: attempted.into(),
        }
    }

    pub fn persistence(message: impl Into<String>) -> Self {
        SubscriptionError::Persistence(message.into())
    }

    /// Returns the error kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SubscriptionError::Validation { .. } | SubscriptionError::InvalidPlan(_) => {
                ErrorKind::Validation
            }
            SubscriptionError::NotFound { .. } => ErrorKind::NotFound,
            SubscriptionError::InvalidState { .. } => ErrorKind::InvalidState,
            SubscriptionError::Gateway { .. } => ErrorKind::Gateway,
            SubscriptionError::Persistence(_) => ErrorKind::Persistence,
        }
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            SubscriptionError::Validation { .. } => ErrorCode::ValidationFailed,
            SubscriptionError::InvalidPlan(_) => ErrorCode::InvalidPlan,
            SubscriptionError::NotFound { .. } => ErrorCode::UserNotFound,
            SubscriptionError::InvalidState { .. } => ErrorCode::InvalidStateTransition,
            SubscriptionError::Gateway { timed_out: true, .. } => ErrorCode::GatewayTimeout,
            SubscriptionError::Gateway { .. } => ErrorCode::GatewayError,
            SubscriptionError::Persistence(_) => ErrorCode::DatabaseError,
        }
    }

    /// Returns a user-friendly error message.
    pub fn message(&self) -> String {
        match self {
            SubscriptionError::Validation { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            SubscriptionError::InvalidPlan(plan) => {
                format!("Plan '{}' is not available for checkout", plan)
            }
            SubscriptionError::NotFound { user_id } => format!("User not found: {}", user_id),
            SubscriptionError::InvalidState { current, attempted } => {
                format!("Cannot {} subscription in {} state", attempted, current)
            }
            SubscriptionError::Gateway {
                timed_out: true, ..
            } => "Payment gateway timed out".to_string(),
            SubscriptionError::Gateway {
                status: Some(status),
                message,
                ..
            } => format!("Payment gateway returned {}: {}", status, message),
            SubscriptionError::Gateway { message, .. } => {
                format!("Payment gateway unavailable: {}", message)
            }
            SubscriptionError::Persistence(msg) => format!("Storage error: {}", msg),
        }
    }

    /// Returns true if the caller may retry without changing its input.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Gateway | ErrorKind::Persistence
        )
    }

    /// Suggested HTTP status for the transport layer.
    pub fn http_status(&self) -> u16 {
        match self {
            SubscriptionError::Validation { .. } | SubscriptionError::InvalidPlan(_) => 400,
            SubscriptionError::NotFound { .. } => 404,
            SubscriptionError::InvalidState { .. } => 409,
            SubscriptionError::Gateway { timed_out: true, .. } => 504,
            SubscriptionError::Gateway { .. } => 502,
            SubscriptionError::Persistence(_) => 500,
        }
    }
}

impl std::fmt::Display for SubscriptionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for SubscriptionError {}

impl From<DomainError> for SubscriptionError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::UserNotFound => {
                SubscriptionError::not_found(err.detail("user_id").unwrap_or("unknown"))
            }
            ErrorCode::InvalidPlan => {
                SubscriptionError::invalid_plan(err.detail("plan").unwrap_or(&err.message))
            }
            ErrorCode::ValidationFailed | ErrorCode::InvalidEventType => {
                SubscriptionError::validation(
                    err.detail("field").unwrap_or("unknown"),
                    err.message.clone(),
                )
            }
            ErrorCode::InvalidStateTransition => SubscriptionError::invalid_state(
                err.detail("current").unwrap_or("unknown"),
                err.message.clone(),
            ),
            ErrorCode::GatewayError | ErrorCode::GatewayTimeout => SubscriptionError::Gateway {
                timed_out: err.code == ErrorCode::GatewayTimeout,
                status: err.detail("status").and_then(|s| s.parse().ok()),
                message: err.message.clone(),
            },
            _ => SubscriptionError::Persistence(err.to_string()),
        }
    }
}

impl From<SubscriptionError> for DomainError {
    fn from(err: SubscriptionError) -> Self {
        DomainError::new(err.code(), err.message())
    }
}

impl From<ValidationError> for SubscriptionError {
    fn from(err: ValidationError) -> Self {
        SubscriptionError::validation(err.field().to_string(), err.to_string())
    }
}

impl From<InvalidTransition> for SubscriptionError {
    fn from(err: InvalidTransition) -> Self {
        SubscriptionError::invalid_state(err.from, format!("move to {}", err.to))
    }
}
