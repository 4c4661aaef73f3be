//! API route modules.

pub mod capture;
pub mod health;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Create the main router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .merge(capture::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use cortex_core::capture::{CaptureHandler, InMemoryPatternStore};
    use cortex_core::gateway::{EncodeResponse, GatewayHealth, RecalledMemory};
    use cortex_core::{CandidateMemory, Config, Error, MemoryGateway, Result, Shard};
    use http_body_util::BodyExt;
    use std::sync::Mutex;
    use tower::ServiceExt;

    /// Gateway double: records encodes, optionally down.
    #[derive(Default)]
    struct StubGateway {
        down: bool,
        encoded: Mutex<Vec<CandidateMemory>>,
    }

    #[async_trait]
    impl MemoryGateway for StubGateway {
        async fn encode(&self, memory: &CandidateMemory) -> Result<EncodeResponse> {
            if self.down {
                return Err(Error::GatewayUnreachable("connection refused".into()));
            }
            self.encoded.lock().unwrap().push(memory.clone());
            Ok(EncodeResponse {
                ok: true,
                deduplicated: false,
                id: Some("m-1".into()),
            })
        }

        async fn recall(&self, _: &str, _: usize, _: Option<&[Shard]>) -> Result<Vec<RecalledMemory>> {
            if self.down {
                return Err(Error::GatewayUnreachable("connection refused".into()));
            }
            Ok(Vec::new())
        }

        async fn health(&self) -> Result<GatewayHealth> {
            if self.down {
                return Err(Error::GatewayUnreachable("connection refused".into()));
            }
            Ok(GatewayHealth {
                status: "ok".into(),
                total_memories: 42,
            })
        }
    }

    fn app(gateway: Arc<StubGateway>) -> Router {
        let config = Config::default();
        let capture = CaptureHandler::new(
            gateway,
            Arc::new(InMemoryPatternStore::new()),
            config.capture.clone(),
        );
        create_router(Arc::new(AppState::new(config, capture)))
    }

    fn json_req(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap()
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_json(resp: axum::response::Response) -> serde_json::Value {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn curl() -> serde_json::Value {
        serde_json::json!({
            "tool": "exec",
            "args": {"command": "curl https://x"},
            "error": null,
            "result": "200 OK"
        })
    }

    #[tokio::test]
    async fn test_first_call_encoded_novel() {
        let gateway = Arc::new(StubGateway::default());
        let resp = app(gateway.clone())
            .oneshot(json_req("/auto-capture", curl()))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["ok"], true);
        assert_eq!(body["action"], "encoded-novel");
        assert_eq!(body["signature"], "exec:curl");
        assert!(body["latencyMs"].is_u64());
        assert_eq!(gateway.encoded.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_third_call_not_encoded() {
        let gateway = Arc::new(StubGateway::default());
        let app = app(gateway.clone());
        for _ in 0..2 {
            app.clone().oneshot(json_req("/auto-capture", curl())).await.unwrap();
        }
        let body = body_json(app.oneshot(json_req("/auto-capture", curl())).await.unwrap()).await;

        assert_eq!(body["action"], "skipped-repeated");
        assert_eq!(body["outcome"], "repeated");
        assert_eq!(gateway.encoded.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_tool_is_400_with_body() {
        let resp = app(Arc::new(StubGateway::default()))
            .oneshot(json_req("/auto-capture", serde_json::json!({"args": {}})))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = body_json(resp).await;
        assert_eq!(body["ok"], false);
        assert!(body["error"].as_str().unwrap().contains("tool"));
        assert!(body["latencyMs"].is_u64());
    }

    #[tokio::test]
    async fn test_unparseable_body_is_400_with_body() {
        let req = Request::builder()
            .method("POST")
            .uri("/auto-capture")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let resp = app(Arc::new(StubGateway::default())).oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["ok"], false);
    }

    #[tokio::test]
    async fn test_gateway_down_is_502_with_body() {
        let gateway = Arc::new(StubGateway {
            down: true,
            ..Default::default()
        });
        let resp = app(gateway).oneshot(json_req("/auto-capture", curl())).await.unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        let body = body_json(resp).await;
        assert_eq!(body["ok"], false);
        assert_eq!(body["signature"], "exec:curl");
        assert!(body["error"].as_str().unwrap().contains("unreachable"));
    }

    #[tokio::test]
    async fn test_stats_lists_signatures() {
        let app = app(Arc::new(StubGateway::default()));
        for _ in 0..3 {
            app.clone().oneshot(json_req("/auto-capture", curl())).await.unwrap();
        }
        let body = body_json(app.oneshot(get_req("/auto-capture/stats?limit=5")).await.unwrap()).await;

        assert_eq!(body["trackedSignatures"], 1);
        assert_eq!(body["topSignatures"][0]["signature"], "exec:curl");
        assert_eq!(body["topSignatures"][0]["count"], 3);
    }

    #[tokio::test]
    async fn test_health_reports_gateway() {
        let body = body_json(
            app(Arc::new(StubGateway::default()))
                .oneshot(get_req("/health"))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["gateway"]["totalMemories"], 42);

        let down = Arc::new(StubGateway {
            down: true,
            ..Default::default()
        });
        let body = body_json(app(down).oneshot(get_req("/health")).await.unwrap()).await;
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["gateway"]["reachable"], false);
    }
}
