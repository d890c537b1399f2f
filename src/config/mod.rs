//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables using the
//! `config` and `dotenvy` crates. Variables use the `STORYNEST` prefix and
//! `__` between nested keys.
//!
//! # Example
//!
//! ```no_run
//! use storynest_billing::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Gateway at {}", config.gateway.base_url);
//! ```

mod database;
mod error;
mod gateway;
mod redis;
mod server;

pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use gateway::GatewayConfig;
pub use redis::RedisConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root configuration of the billing service.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Environment and logging
    #[serde(default)]
    pub server: ServerConfig,

    /// PostgreSQL (ledger and user table)
    pub database: DatabaseConfig,

    /// Redis cache; invalidation is a no-op when absent
    pub redis: Option<RedisConfig>,

    /// Payment microservice
    pub gateway: GatewayConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// 1. Loads `.env` if present (development)
    /// 2. Reads variables with the `STORYNEST` prefix
    /// 3. Splits nested keys on `__`
    ///
    /// # Environment Variable Format
    ///
    /// - `STORYNEST__DATABASE__URL=...` -> `database.url`
    /// - `STORYNEST__GATEWAY__TIMEOUT_SECS=5` -> `gateway.timeout_secs`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("STORYNEST")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Semantic validation of every section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        if let Some(redis) = &self.redis {
            redis.validate()?;
        }
        self.gateway.validate(self.is_production())?;
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Env vars are process-global
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: [&str; 6] = [
        "STORYNEST__DATABASE__URL",
        "STORYNEST__GATEWAY__BASE_URL",
        "STORYNEST__GATEWAY__TIMEOUT_SECS",
        "STORYNEST__GATEWAY__API_KEY",
        "STORYNEST__REDIS__URL",
        "STORYNEST__SERVER__ENVIRONMENT",
    ];

    fn set_minimal_env() {
        env::set_var("STORYNEST__DATABASE__URL", "postgresql://test@localhost/test");
        env::set_var("STORYNEST__GATEWAY__BASE_URL", "http://payments:8000");
    }

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let config = result.expect("config should load");
        assert_eq!(config.database.url, "postgresql://test@localhost/test");
        assert_eq!(config.gateway.base_url, "http://payments:8000");
        assert_eq!(config.gateway.timeout_secs, 10);
        assert!(config.redis.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_optional_sections() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("STORYNEST__REDIS__URL", "redis://localhost:6379");
        env::set_var("STORYNEST__GATEWAY__API_KEY", "gw_secret");
        env::set_var("STORYNEST__GATEWAY__TIMEOUT_SECS", "3");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.redis.unwrap().url, "redis://localhost:6379");
        assert!(config.gateway.api_key.is_some());
        assert_eq!(config.gateway.timeout_secs, 3);
    }

    #[test]
    fn test_production_requires_https_gateway() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("STORYNEST__SERVER__ENVIRONMENT", "production");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(config.is_production());
        assert_eq!(config.validate(), Err(ValidationError::GatewayMustBeHttps));
    }

    #[test]
    fn test_missing_database_fails_to_load() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        env::set_var("STORYNEST__GATEWAY__BASE_URL", "http://payments:8000");
        let result = AppConfig::load();
        clear_env();

        assert!(result.is_err());
    }
}
