//! Application setup and initialization

pub mod routes;
pub mod server;

use std::sync::Arc;

use anyhow::{Context, Result};
use lumigrade_core::Config;

use crate::state::AppState;

/// Validate the configuration, start tracing and build the router.
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    config
        .validate()
        .context("Configuration validation failed")?;

    crate::telemetry::init_telemetry(config.log_format)
        .context("Failed to initialize telemetry")?;

    tracing::info!(
        environment = %config.environment,
        max_dim = config.max_dim,
        jpeg_quality = config.jpeg_quality,
        "Configuration loaded and validated successfully"
    );

    let state = Arc::new(AppState::new(config.clone()));
    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
