//! Marketplace API server binary.
//!
//! Loads configuration, initializes logging, selects the store backend,
//! optionally seeds demo data, and serves the HTTP API until `Ctrl-C`.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `marketplace-config.yaml` (or the path in
//!    `MARKETPLACE_CONFIG`), with environment overrides
//! 2. Initialize structured logging (tracing)
//! 3. Build the store: in-memory, or `PostgreSQL` with migrations
//! 4. Seed demo data if enabled and the store is empty
//! 5. Serve the API

mod error;
mod seed;

use std::path::PathBuf;
use std::sync::Arc;

use marketplace_api::{start_server, AppState, ServerConfig};
use marketplace_core::config::{LogFormat, LoggingConfig, MarketConfig, StorageBackend};
use marketplace_core::{Marketplace, MemoryMarketplace};
use marketplace_db::{PgMarketplace, PostgresConfig, PostgresPool};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::ServerError;

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "marketplace-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if any startup step fails or the server stops
/// abnormally.
#[tokio::main]
async fn main() -> Result<(), ServerError> {
    let config = load_config()?;
    init_logging(&config.logging)?;

    info!(
        host = config.server.host,
        port = config.server.port,
        backend = ?config.storage.backend,
        unpaid_jobs_filter = ?config.policy.unpaid_jobs_filter,
        "Configuration loaded"
    );

    let policy = config.market_policy()?;
    match config.storage.backend {
        StorageBackend::Memory => {
            info!("Using in-memory store");
            serve(MemoryMarketplace::with_policy(policy), &config).await
        }
        StorageBackend::Postgres => {
            let pool = PostgresPool::connect(&PostgresConfig::from(&config.database)).await?;
            if config.storage.run_migrations {
                pool.run_migrations().await?;
            }
            let result = serve(PgMarketplace::from_pool(&pool, policy), &config).await;
            pool.close().await;
            result
        }
    }
}

/// Seed if asked, then serve until shutdown.
async fn serve<S: Marketplace>(store: S, config: &MarketConfig) -> Result<(), ServerError> {
    if config.seed.demo_data {
        seed::seed_demo(&store).await?;
    }

    let state = Arc::new(AppState::new(
        store,
        config.policy.best_clients_default_limit,
    ));
    let server = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
    };
    start_server(&server, state).await?;
    Ok(())
}

/// Load configuration from `MARKETPLACE_CONFIG` or the default path.
///
/// A missing file means defaults plus environment overrides.
fn load_config() -> Result<MarketConfig, ServerError> {
    let path = std::env::var("MARKETPLACE_CONFIG")
        .map_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    if path.exists() {
        return Ok(MarketConfig::from_file(&path)?);
    }
    let mut config = MarketConfig::default();
    config.apply_overrides(|key| std::env::var(key).ok())?;
    config.validate()?;
    Ok(config)
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level when set.
fn init_logging(logging: &LoggingConfig) -> Result<(), ServerError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    let installed = match logging.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    };
    installed.map_err(|e| ServerError::Logging {
        message: e.to_string(),
    })
}
