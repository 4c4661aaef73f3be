//! In-process test doubles.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::error::{Error, Result};
use crate::gateway::{EncodeResponse, GatewayHealth, MemoryGateway, RecalledMemory};
use crate::types::{CandidateMemory, Shard};

/// Records encodes and serves canned recall results.
///
/// Encoding the same content twice reports `deduplicated`, like the real
/// gateway would. Contents containing `fail_on` fail with a gateway error.
#[derive(Default)]
pub struct FakeGateway {
    encoded: Mutex<Vec<CandidateMemory>>,
    recall_results: Vec<RecalledMemory>,
    recalls: AtomicUsize,
    unreachable: bool,
    fail_on: Option<String>,
}

impl FakeGateway {
    pub fn with_recall(results: Vec<RecalledMemory>) -> Self {
        Self {
            recall_results: results,
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            unreachable: true,
            ..Default::default()
        }
    }

    pub fn failing_on(needle: &str) -> Self {
        Self {
            fail_on: Some(needle.to_string()),
            ..Default::default()
        }
    }

    pub fn encoded(&self) -> Vec<CandidateMemory> {
        self.encoded.lock().unwrap().clone()
    }

    pub fn recall_count(&self) -> usize {
        self.recalls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MemoryGateway for FakeGateway {
    async fn encode(&self, memory: &CandidateMemory) -> Result<EncodeResponse> {
        if self.unreachable {
            return Err(Error::GatewayUnreachable("connection refused".into()));
        }
        if let Some(ref needle) = self.fail_on {
            if memory.content.contains(needle.as_str()) {
                return Err(Error::gateway(500, "encode failed"));
            }
        }
        let mut encoded = self.encoded.lock().unwrap();
        let deduplicated = encoded.iter().any(|m| m.content == memory.content);
        encoded.push(memory.clone());
        Ok(EncodeResponse {
            ok: true,
            deduplicated,
            id: None,
        })
    }

    async fn recall(
        &self,
        _query: &str,
        limit: usize,
        _shards: Option<&[Shard]>,
    ) -> Result<Vec<RecalledMemory>> {
        self.recalls.fetch_add(1, Ordering::SeqCst);
        if self.unreachable {
            return Err(Error::GatewayUnreachable("connection refused".into()));
        }
        Ok(self.recall_results.iter().take(limit).cloned().collect())
    }

    async fn health(&self) -> Result<GatewayHealth> {
        if self.unreachable {
            return Err(Error::GatewayUnreachable("connection refused".into()));
        }
        Ok(GatewayHealth {
            status: "ok".into(),
            total_memories: self.encoded.lock().unwrap().len() as u64,
        })
    }
}
