//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors, state machine)
//! - `subscription` - Subscription mirror, payment events and their errors

pub mod foundation;
pub mod subscription;
