//! Health check endpoint.

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub gateway: GatewayStatus,
    pub tracked_signatures: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayStatus {
    pub url: String,
    pub reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_memories: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthStatus> {
    let (reachable, total_memories, error) = match state.capture.gateway().health().await {
        Ok(health) => (true, Some(health.total_memories), None),
        Err(e) => (false, None, Some(e.to_string())),
    };

    let status = if reachable { "healthy" } else { "degraded" };

    Json(HealthStatus {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        gateway: GatewayStatus {
            url: state.config.gateway.url.clone(),
            reachable,
            total_memories,
            error,
        },
        tracked_signatures: state.capture.patterns().len(),
    })
}
