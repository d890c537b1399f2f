//! Subscription domain module.
//!
//! Local mirror of gateway-owned billing state, plus the ledger entry that
//! makes event ingestion idempotent.
//!
//! # Module Structure
//!
//! - `plan` - SubscriptionPlan
//! - `status` - SubscriptionStatus state machine
//! - `record` - SubscriptionRecord and its invariants
//! - `payment_event` - PaymentEvent ledger entry and PaymentEventType
//! - `payload` - typed reader for event payloads
//! - `errors` - SubscriptionError

mod errors;
mod payload;
mod payment_event;
mod plan;
mod record;
mod status;

pub use errors::{ErrorKind, SubscriptionError};
pub use payload::EventPayload;
pub use payment_event::{PaymentEvent, PaymentEventType};
pub use plan::SubscriptionPlan;
pub use record::{SubscriptionRecord, SubscriptionSnapshot};
pub use status::SubscriptionStatus;
