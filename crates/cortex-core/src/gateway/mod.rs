//! Memory gateway interface.
//!
//! The gateway owns persistence, embedding similarity, decay and
//! reinforcement. Cortex only consumes three operations:
//!
//! - `encode` - store a memory, rejecting near-duplicates above a threshold
//! - `recall` - semantic search over stored memories
//! - `health` - liveness and memory count
//!
//! [`MemoryGateway`] is the seam; [`HttpGateway`] talks to a running gateway
//! over HTTP and tests substitute in-process doubles.

#[cfg(feature = "client")]
mod client;

#[cfg(feature = "client")]
pub use client::HttpGateway;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{CandidateMemory, Shard};

/// Result of an `encode` call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EncodeResponse {
    #[serde(default)]
    pub ok: bool,
    /// The gateway matched an existing memory above the dedup threshold.
    #[serde(default)]
    pub deduplicated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// Body of a `recall` call.
#[derive(Debug, Clone, Serialize)]
pub struct RecallRequest<'a> {
    pub query: &'a str,
    pub limit: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shards: Option<&'a [Shard]>,
}

/// A memory returned by `recall`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecalledMemory {
    #[serde(default)]
    pub content: String,
    /// Metadata stored with the memory; object or JSON-encoded string.
    #[serde(default)]
    pub context: serde_json::Value,
    #[serde(default)]
    pub similarity: f64,
    #[serde(default)]
    pub trigger: String,
}

impl RecalledMemory {
    /// Context metadata as a JSON value, decoding string-encoded context.
    ///
    /// Undecodable context yields `Value::Null`.
    pub fn context_value(&self) -> serde_json::Value {
        match &self.context {
            serde_json::Value::String(raw) => {
                serde_json::from_str(raw).unwrap_or(serde_json::Value::Null)
            }
            other => other.clone(),
        }
    }

    /// Look up a string field in the context metadata.
    pub fn context_str(&self, key: &str) -> Option<String> {
        self.context_value()
            .get(key)
            .and_then(|v| v.as_str())
            .map(String::from)
    }
}

/// Gateway health report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayHealth {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub total_memories: u64,
}

/// Operations consumed from the external memory gateway.
#[async_trait]
pub trait MemoryGateway: Send + Sync {
    /// Store a memory.
    async fn encode(&self, memory: &CandidateMemory) -> Result<EncodeResponse>;

    /// Semantic search over stored memories, optionally restricted to shards.
    async fn recall(
        &self,
        query: &str,
        limit: usize,
        shards: Option<&[Shard]>,
    ) -> Result<Vec<RecalledMemory>>;

    /// Liveness check.
    async fn health(&self) -> Result<GatewayHealth>;
}
