//! Payment gateway configuration

use secrecy::SecretString;
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Payment microservice connection
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Base URL; `/checkout` and `/cancel` are appended
    pub base_url: String,

    /// Bearer token sent with every call, if set
    pub api_key: Option<SecretString>,

    /// Per-call deadline in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Value stored as `provider` on records this gateway manages
    #[serde(default = "default_provider_name")]
    pub provider_name: String,
}

impl GatewayConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            timeout_secs: default_timeout(),
            provider_name: default_provider_name(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate gateway configuration
    pub fn validate(&self, production: bool) -> Result<(), ValidationError> {
        if self.base_url.is_empty() {
            return Err(ValidationError::MissingRequired("GATEWAY__BASE_URL"));
        }
        let https = self.base_url.starts_with("https://");
        if !https && !self.base_url.starts_with("http://") {
            return Err(ValidationError::InvalidGatewayUrl);
        }
        if production && !https {
            return Err(ValidationError::GatewayMustBeHttps);
        }
        if !(1..=120).contains(&self.timeout_secs) {
            return Err(ValidationError::InvalidGatewayTimeout);
        }
        Ok(())
    }
}

fn default_timeout() -> u64 {
    10
}

fn default_provider_name() -> String {
    "gateway".to_string()
}
