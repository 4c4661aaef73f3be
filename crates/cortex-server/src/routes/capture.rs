//! Auto-capture endpoints.

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use cortex_core::capture::{CaptureFailure, CaptureRequest, CaptureResponse};
use cortex_core::Error;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use crate::state::AppState;

/// Create auto-capture router
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auto-capture", post(auto_capture))
        .route("/auto-capture/stats", get(capture_stats))
}

fn status_for(response: &CaptureResponse) -> StatusCode {
    match response.failure {
        None => StatusCode::OK,
        Some(CaptureFailure::InvalidInput) => StatusCode::BAD_REQUEST,
        Some(CaptureFailure::Gateway) => StatusCode::BAD_GATEWAY,
    }
}

/// Classify one tool call and encode it if it is worth remembering.
///
/// Always answers with a JSON body, including for unparseable input.
pub async fn auto_capture(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CaptureRequest>, JsonRejection>,
) -> (StatusCode, Json<CaptureResponse>) {
    let started = Instant::now();
    let response = match payload {
        Ok(Json(req)) => state.capture.handle(req).await,
        Err(rejection) => {
            let mut response = CaptureResponse::failed(&Error::invalid_input(rejection.body_text()));
            response.latency_ms = started.elapsed().as_millis() as u64;
            response
        }
    };
    (status_for(&response), Json(response))
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    #[serde(default = "default_stats_limit")]
    pub limit: usize,
}

fn default_stats_limit() -> usize {
    20
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureStats {
    pub tracked_signatures: usize,
    pub top_signatures: Vec<SignatureCount>,
}

#[derive(Debug, Serialize)]
pub struct SignatureCount {
    pub signature: String,
    pub count: u32,
}

/// Tracked signatures, most frequent first.
pub async fn capture_stats(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatsQuery>,
) -> Json<CaptureStats> {
    let patterns = state.capture.patterns();
    let top_signatures = patterns
        .snapshot()
        .into_iter()
        .take(query.limit)
        .map(|(signature, count)| SignatureCount { signature, count })
        .collect();

    Json(CaptureStats {
        tracked_signatures: patterns.len(),
        top_signatures,
    })
}
