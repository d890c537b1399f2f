//! Payment gateway adapters.
//!
//! - `HttpGatewayClient` - reqwest client for the payment microservice
//! - `MockGatewayClient` - call-logging mock with error injection
//!
//! ## Security
//!
//! - The optional API key is held as `secrecy::SecretString` and only exposed
//!   when building the `Authorization` header

mod http_gateway;
mod mock_gateway;
mod wire_types;

pub use http_gateway::HttpGatewayClient;
pub use mock_gateway::{GatewayCall, MockGatewayClient, CANCEL_METHOD, CHECKOUT_METHOD};
