// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Kawasan-Map API Server
//!
//! Serves conservation-area layers, reprojected to EPSG:4326, to the
//! browser map viewer.

use kawasan_map::{config::Config, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured JSON logging
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Kawasan-Map API");
    tracing::info!(
        kawasan = %config.kawasan_source,
        getaci = %config.getaci_source,
        timeout_secs = config.fetch_timeout.as_secs(),
        policy = ?config.invalid_coordinates,
        "Dataset sources configured"
    );

    // Build shared state; layers are loaded on request
    let state = Arc::new(AppState::new(config.clone())?);

    // Build router
    let app = kawasan_map::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() -> anyhow::Result<()> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            EnvFilter::from_default_env()
                .add_directive("kawasan_map=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .try_init()?;
    Ok(())
}
