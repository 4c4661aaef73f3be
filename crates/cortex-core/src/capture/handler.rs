//! Capture route handling.
//!
//! Orchestrates one inbound tool call: skip, classify, then reinforce or
//! encode against the memory gateway. Every path produces a
//! [`CaptureResponse`] carrying the elapsed latency; gateway failures are
//! reported in the response, never raised.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::classifier::{Outcome, OutcomeClassifier};
use super::content::{build_failure_memory, build_novel_memory, describe_call};
use super::tracker::PatternStore;
use crate::config::CaptureConfig;
use crate::error::{Error, Result};
use crate::gateway::MemoryGateway;
use crate::types::{Shard, ToolCallRecord};

/// Inbound capture body. Fields are loose so malformed input can be
/// reported instead of rejected by the deserializer.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureRequest {
    #[serde(default)]
    pub tool: Option<String>,
    #[serde(default)]
    pub args: serde_json::Value,
    #[serde(default)]
    pub result: serde_json::Value,
    #[serde(default)]
    pub error: serde_json::Value,
    #[serde(default)]
    pub duration_ms: Option<u64>,
}

impl CaptureRequest {
    /// Validate and convert into a tool call record.
    pub fn into_record(self) -> Result<ToolCallRecord> {
        let tool = self
            .tool
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::invalid_input("missing required field: tool"))?;

        Ok(ToolCallRecord {
            tool,
            args: self.args,
            result: value_text(self.result),
            error: value_text(self.error),
            duration_ms: self.duration_ms,
        })
    }
}

impl From<ToolCallRecord> for CaptureRequest {
    fn from(record: ToolCallRecord) -> Self {
        Self {
            tool: Some(record.tool),
            args: record.args,
            result: record.result.map(serde_json::Value::String).unwrap_or_default(),
            error: record.error.map(serde_json::Value::String).unwrap_or_default(),
            duration_ms: record.duration_ms,
        }
    }
}

/// Strings pass through; other non-null JSON is serialized.
fn value_text(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// What the handler did with a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CaptureAction {
    SkippedLowValue,
    SkippedRepeated,
    Reinforced,
    EncodedFailure,
    EncodedNovel,
}

/// Why a capture did not succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureFailure {
    InvalidInput,
    Gateway,
}

/// Capture endpoint response body.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<CaptureAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deduplicated: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub latency_ms: u64,
    #[serde(skip)]
    pub failure: Option<CaptureFailure>,
}

impl CaptureResponse {
    fn action(action: CaptureAction) -> Self {
        Self {
            ok: true,
            action: Some(action),
            ..Default::default()
        }
    }

    /// A failed response; input errors and gateway errors are told apart.
    pub fn failed(err: &Error) -> Self {
        let failure = match err {
            Error::InvalidInput(_) => CaptureFailure::InvalidInput,
            _ => CaptureFailure::Gateway,
        };
        Self {
            ok: false,
            error: Some(err.to_string()),
            failure: Some(failure),
            ..Default::default()
        }
    }
}

/// Decides whether tool calls become memories.
#[derive(Clone)]
pub struct CaptureHandler {
    gateway: Arc<dyn MemoryGateway>,
    classifier: OutcomeClassifier,
    config: CaptureConfig,
}

impl CaptureHandler {
    pub fn new(
        gateway: Arc<dyn MemoryGateway>,
        patterns: Arc<dyn PatternStore>,
        config: CaptureConfig,
    ) -> Self {
        Self::with_classifier(gateway, OutcomeClassifier::new(patterns), config)
    }

    pub fn with_classifier(
        gateway: Arc<dyn MemoryGateway>,
        classifier: OutcomeClassifier,
        config: CaptureConfig,
    ) -> Self {
        Self {
            gateway,
            classifier,
            config,
        }
    }

    pub fn patterns(&self) -> &Arc<dyn PatternStore> {
        self.classifier.patterns()
    }

    pub fn gateway(&self) -> &Arc<dyn MemoryGateway> {
        &self.gateway
    }

    /// Handle one capture request.
    pub async fn handle(&self, req: CaptureRequest) -> CaptureResponse {
        let started = Instant::now();
        let mut response = match req.into_record() {
            Ok(record) => self.capture(&record).await,
            Err(e) => {
                debug!("Rejected capture: {}", e);
                CaptureResponse::failed(&e)
            }
        };
        response.latency_ms = started.elapsed().as_millis() as u64;
        response
    }

    fn is_low_value(&self, record: &ToolCallRecord) -> bool {
        !record.has_error() && self.config.skip_tools.iter().any(|t| t == &record.tool)
    }

    async fn capture(&self, record: &ToolCallRecord) -> CaptureResponse {
        if self.is_low_value(record) {
            return CaptureResponse::action(CaptureAction::SkippedLowValue);
        }

        let classification = self.classifier.classify(record);
        debug!(
            signature = %classification.signature,
            outcome = %classification.outcome,
            prior = classification.prior_count,
            "Classified tool call"
        );

        let mut response = match classification.outcome {
            Outcome::Repeated => {
                let action = if self.try_reinforce(record).await {
                    CaptureAction::Reinforced
                } else {
                    CaptureAction::SkippedRepeated
                };
                CaptureResponse::action(action)
            }
            Outcome::Failure | Outcome::Novel => {
                self.encode(record, &classification.signature, classification.outcome)
                    .await
            }
        };

        response.outcome = Some(classification.outcome);
        response.signature = Some(classification.signature);
        response
    }

    /// Recall a matching memory so the gateway can strengthen it.
    ///
    /// Any recall failure counts as "nothing to reinforce".
    async fn try_reinforce(&self, record: &ToolCallRecord) -> bool {
        let query = describe_call(record);
        match self
            .gateway
            .recall(&query, 3, Some(&[Shard::Procedural][..]))
            .await
        {
            Ok(memories) => memories
                .iter()
                .any(|m| m.similarity >= self.config.recall_similarity_floor),
            Err(e) => {
                warn!("Reinforcement recall failed: {}", e);
                false
            }
        }
    }

    async fn encode(&self, record: &ToolCallRecord, signature: &str, outcome: Outcome) -> CaptureResponse {
        let (memory, action) = match outcome {
            Outcome::Failure => (
                build_failure_memory(record, signature, self.config.failure_dedup_threshold),
                CaptureAction::EncodedFailure,
            ),
            _ => (
                build_novel_memory(record, signature, self.config.novel_dedup_threshold),
                CaptureAction::EncodedNovel,
            ),
        };

        match self.gateway.encode(&memory).await {
            Ok(resp) if resp.ok => {
                info!(signature, deduplicated = resp.deduplicated, "Captured {} memory", outcome);
                CaptureResponse {
                    deduplicated: Some(resp.deduplicated),
                    ..CaptureResponse::action(action)
                }
            }
            Ok(_) => {
                let err = Error::Other("memory gateway rejected the memory".into());
                warn!(signature, "Encode rejected by gateway");
                CaptureResponse::failed(&err)
            }
            Err(e) => {
                warn!(signature, "Encode failed: {}", e);
                CaptureResponse::failed(&e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeGateway;
    use crate::capture::tracker::InMemoryPatternStore;
    use crate::gateway::RecalledMemory;
    use serde_json::json;

    fn handler(gateway: Arc<FakeGateway>) -> CaptureHandler {
        CaptureHandler::new(
            gateway,
            Arc::new(InMemoryPatternStore::new()),
            CaptureConfig::default(),
        )
    }

    fn curl_request() -> CaptureRequest {
        serde_json::from_value(json!({
            "tool": "exec",
            "args": {"command": "curl https://x"},
            "error": null,
            "result": "200 OK"
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_missing_tool_is_rejected_without_side_effects() {
        let gateway = Arc::new(FakeGateway::default());
        let handler = handler(gateway.clone());

        let resp = handler
            .handle(serde_json::from_value(json!({"args": {"command": "ls"}})).unwrap())
            .await;

        assert!(!resp.ok);
        assert_eq!(resp.failure, Some(CaptureFailure::InvalidInput));
        assert!(resp.error.unwrap().contains("tool"));
        assert!(handler.patterns().is_empty());
        assert!(gateway.encoded().is_empty());
    }

    #[tokio::test]
    async fn test_first_occurrence_is_encoded_novel() {
        let gateway = Arc::new(FakeGateway::default());
        let handler = handler(gateway.clone());

        let resp = handler.handle(curl_request()).await;

        assert!(resp.ok);
        assert_eq!(resp.action, Some(CaptureAction::EncodedNovel));
        assert_eq!(resp.signature.as_deref(), Some("exec:curl"));
        assert_eq!(resp.deduplicated, Some(false));
        assert_eq!(gateway.encoded().len(), 1);
    }

    #[tokio::test]
    async fn test_third_occurrence_is_not_encoded_again() {
        let gateway = Arc::new(FakeGateway::default());
        let handler = handler(gateway.clone());

        handler.handle(curl_request()).await;
        handler.handle(curl_request()).await;
        let third = handler.handle(curl_request()).await;

        assert_eq!(third.outcome, Some(Outcome::Repeated));
        assert_eq!(third.action, Some(CaptureAction::SkippedRepeated));
        assert_eq!(gateway.encoded().len(), 2);
        assert_eq!(gateway.recall_count(), 1);
    }

    #[tokio::test]
    async fn test_repeated_with_similar_memory_is_reinforced() {
        let gateway = Arc::new(FakeGateway::with_recall(vec![RecalledMemory {
            content: "exec succeeded with command `curl https://x`".into(),
            similarity: 0.82,
            ..Default::default()
        }]));
        let handler = handler(gateway.clone());
        handler.patterns().warm("exec:curl", 3);

        let resp = handler.handle(curl_request()).await;
        assert_eq!(resp.action, Some(CaptureAction::Reinforced));
        assert!(gateway.encoded().is_empty());
    }

    #[tokio::test]
    async fn test_weak_recall_match_is_not_reinforced() {
        let gateway = Arc::new(FakeGateway::with_recall(vec![RecalledMemory {
            similarity: 0.4,
            ..Default::default()
        }]));
        let handler = handler(gateway.clone());
        handler.patterns().warm("exec:curl", 3);

        let resp = handler.handle(curl_request()).await;
        assert_eq!(resp.action, Some(CaptureAction::SkippedRepeated));
    }

    #[tokio::test]
    async fn test_recall_failure_falls_back_to_skipped() {
        let gateway = Arc::new(FakeGateway::failing());
        let handler = handler(gateway.clone());
        handler.patterns().warm("exec:curl", 3);

        let resp = handler.handle(curl_request()).await;
        assert!(resp.ok);
        assert_eq!(resp.action, Some(CaptureAction::SkippedRepeated));
    }

    #[tokio::test]
    async fn test_scp_permission_failure_is_encoded() {
        let gateway = Arc::new(FakeGateway::default());
        let handler = handler(gateway.clone());

        let resp = handler
            .handle(
                serde_json::from_value(json!({
                    "tool": "exec",
                    "args": {"command": "scp file"},
                    "error": "Permission denied (publickey)"
                }))
                .unwrap(),
            )
            .await;

        assert_eq!(resp.action, Some(CaptureAction::EncodedFailure));
        let encoded = gateway.encoded();
        assert!(encoded[0].content.contains("remote execution tool"));
        assert_eq!(encoded[0].dedup_threshold, 0.85);
    }

    #[tokio::test]
    async fn test_low_value_tool_skipped_unless_error() {
        let gateway = Arc::new(FakeGateway::default());
        let handler = handler(gateway.clone());

        let ok_read = ToolCallRecord::new("read", json!({"path": "a.md"})).with_result("# A");
        let resp = handler.handle(ok_read.into()).await;
        assert_eq!(resp.action, Some(CaptureAction::SkippedLowValue));
        assert!(handler.patterns().is_empty());

        let bad_read = ToolCallRecord::new("read", json!({"path": "a.md"}))
            .with_error("ENOENT: no such file or directory");
        let resp = handler.handle(bad_read.into()).await;
        assert_eq!(resp.action, Some(CaptureAction::EncodedFailure));
        assert_eq!(resp.signature.as_deref(), Some("read:md"));
    }

    #[tokio::test]
    async fn test_encode_transport_error_is_structured() {
        let gateway = Arc::new(FakeGateway::failing());
        let handler = handler(gateway.clone());

        let resp = handler.handle(curl_request()).await;
        assert!(!resp.ok);
        assert_eq!(resp.failure, Some(CaptureFailure::Gateway));
        assert_eq!(resp.outcome, Some(Outcome::Novel));
        assert!(resp.error.unwrap().contains("unreachable"));
    }

    #[tokio::test]
    async fn test_non_string_result_is_serialized() {
        let req: CaptureRequest = serde_json::from_value(json!({
            "tool": "nodes",
            "args": {"action": "status"},
            "result": {"online": 3}
        }))
        .unwrap();
        let record = req.into_record().unwrap();
        assert_eq!(record.result.as_deref(), Some(r#"{"online":3}"#));
        assert_eq!(record.error, None);
    }

    #[test]
    fn test_response_serialization() {
        let resp = CaptureResponse {
            latency_ms: 12,
            deduplicated: Some(true),
            ..CaptureResponse::action(CaptureAction::EncodedNovel)
        };
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["action"], "encoded-novel");
        assert_eq!(value["latencyMs"], 12);
        assert_eq!(value["deduplicated"], true);
        assert!(value.get("error").is_none());
        assert!(value.get("failure").is_none());
    }
}
