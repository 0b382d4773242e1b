// Initialization utilities for CLI runs
//
// Object store and logging/tracing setup

use anyhow::{Context, Result};
use pickups2deepar_config::{LogFormat, LoggingConfig, RuntimeConfig};
use pickups2deepar_storage::ObjectStore;
use tracing::info;

/// Build the object store for the configured backend
pub fn init_store(config: &RuntimeConfig) -> Result<ObjectStore> {
    info!(
        "Initializing object store with storage backend: {}",
        config.storage.backend
    );

    ObjectStore::from_config(&config.storage).context("Failed to initialize storage")
}

/// Initialize tracing/logging from LoggingConfig
pub fn init_tracing(config: &LoggingConfig) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    // Parse log level from config
    let env_filter =
        EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    // Try to set the global subscriber; ignore error if already set (idempotent)
    let _ = match config.format {
        LogFormat::Json => {
            tracing::subscriber::set_global_default(registry.with(fmt::layer().json()))
        }
        LogFormat::Text => tracing::subscriber::set_global_default(registry.with(fmt::layer())),
    };
}
