//! StoryNest Billing - Subscription and payment-event core
//!
//! Keeps a local mirror of each user's subscription in step with the external
//! payment gateway. Gateway events are ingested idempotently through a ledger
//! keyed by event id, then routed to one handler per event type. Users can
//! read their subscription, start a checkout for a paid plan and cancel.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
