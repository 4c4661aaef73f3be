//! cortex-server - auto-capture service
//!
//! Receives tool-call outcomes over HTTP, classifies them and encodes the
//! ones worth remembering into the memory gateway.

use anyhow::Context;
use cortex_core::capture::{warm_pattern_cache, CaptureHandler, InMemoryPatternStore, PatternStore};
use cortex_core::{HttpGateway, MemoryGateway};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;
mod routes;
mod state;

use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("cortex_server=info".parse()?))
        .init();

    info!("cortex-server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let settings = config::Settings::load()?;
    info!("Config loaded from {:?}", settings.config_path);

    let gateway: Arc<dyn MemoryGateway> = Arc::new(HttpGateway::new(&settings.core.gateway)?);
    let patterns: Arc<dyn PatternStore> = Arc::new(InMemoryPatternStore::new());

    // Pre-seed known patterns so they are not re-encoded after a restart
    let warmed = warm_pattern_cache(gateway.as_ref(), patterns.as_ref(), &settings.core.capture).await;
    info!("Pattern cache: {} signatures warmed from {}", warmed, settings.core.gateway.url);

    let capture = CaptureHandler::new(gateway, patterns, settings.core.capture.clone());
    let state = Arc::new(AppState::new(settings.core.clone(), capture));
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(settings.bind)
        .await
        .with_context(|| format!("Failed to bind {}", settings.bind))?;
    info!("Listening on http://{}", settings.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down...");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for ctrl-c: {}", e);
    }
}
