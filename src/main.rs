//! storynest-billing - one-shot migration and replay runner.
//!
//! Loads configuration, initialises tracing, applies migrations, builds the
//! service graph and replays ledger rows left unprocessed by earlier failures,
//! then exits. Serving live deliveries is left to the host process, which
//! embeds `SubscriptionService` from the library.

use std::error::Error;
use std::sync::Arc;

use storynest_billing::adapters::{
    HttpGatewayClient, NoopCacheInvalidator, PostgresEventLedger, PostgresSubscriptionStore,
    RedisCacheInvalidator,
};
use storynest_billing::application::SubscriptionService;
use storynest_billing::config::{AppConfig, ServerConfig};
use storynest_billing::ports::CacheInvalidator;

/// Ledger rows re-dispatched per start-up.
const REPLAY_BATCH: u32 = 500;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let config = AppConfig::load()?;
    config.validate()?;

    init_tracing(&config.server)?;

    tracing::info!(
        environment = ?config.server.environment,
        gateway = %config.gateway.base_url,
        "Starting storynest-billing"
    );

    let pool = config
        .database
        .pool_options()
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");
    }

    let cache: Arc<dyn CacheInvalidator> = match &config.redis {
        Some(redis) => Arc::new(RedisCacheInvalidator::connect(redis).await?),
        None => {
            tracing::warn!("No Redis configured, cache invalidation disabled");
            Arc::new(NoopCacheInvalidator)
        }
    };

    let service = SubscriptionService::new(
        Arc::new(PostgresEventLedger::new(pool.clone())),
        Arc::new(PostgresSubscriptionStore::new(pool.clone())),
        Arc::new(HttpGatewayClient::new(config.gateway.clone())?),
        cache,
    );

    let summary = service.replay_unprocessed(REPLAY_BATCH).await?;
    if summary.failed > 0 {
        tracing::warn!(
            failed = summary.failed,
            "Some payment events are still failing and await redelivery"
        );
    }

    tracing::info!("storynest-billing ready");
    Ok(())
}

fn init_tracing(server: &ServerConfig) -> Result<(), Box<dyn Error + Send + Sync>> {
    let filter = server.log_filter()?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if server.use_json_logs() {
        builder.json().try_init()
    } else {
        builder.compact().try_init()
    }
}
