//! Subscription handlers.
//!
//! ## Events
//! - Idempotent ingestion of gateway events (`EventDispatcher`)
//! - One handler per event type, routed through `HandlerRegistry`
//!
//! ## Commands
//! - Starting checkout for a paid plan
//! - Direct cancellation
//!
//! ## Queries
//! - Get a user's subscription

mod cancel_subscription;
mod create_checkout;
mod event_handlers;
mod get_subscription;
mod process_payment_event;
mod service;

// Events
pub use event_handlers::{HandlerOutcome, HandlerRegistry, PaymentEventHandler};
pub use process_payment_event::{
    EventDispatcher, ProcessOutcome, ProcessPaymentEventCommand, ProcessPaymentEventResult,
    ReplaySummary,
};

// Commands
pub use cancel_subscription::{CancelSubscriptionCommand, CancelSubscriptionHandler};
pub use create_checkout::{CreateCheckoutCommand, CreateCheckoutHandler};

// Queries
pub use get_subscription::{GetSubscriptionHandler, GetSubscriptionQuery, GetSubscriptionResult};

pub use service::SubscriptionService;
