//! HTTP client for the memory gateway.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{EncodeResponse, GatewayHealth, MemoryGateway, RecallRequest, RecalledMemory};
use crate::config::GatewayConfig;
use crate::error::{Error, Result};
use crate::text::truncate;
use crate::types::{CandidateMemory, Shard};

/// Recall responses come either wrapped or as a bare array.
#[derive(Deserialize)]
#[serde(untagged)]
enum RecallEnvelope {
    Wrapped { memories: Vec<RecalledMemory> },
    Bare(Vec<RecalledMemory>),
}

/// Memory gateway client over HTTP
#[derive(Clone)]
pub struct HttpGateway {
    /// Base URL without trailing slash
    base_url: String,
    config: GatewayConfig,
    client: reqwest::Client,
}

impl HttpGateway {
    /// Create a client for the gateway named in the config
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            config: config.clone(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        timeout: Duration,
    ) -> Result<T> {
        debug!("POST {}", path);
        let resp = self
            .client
            .post(self.url(path))
            .timeout(timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| map_send_error(e, timeout))?;
        Self::handle_response(resp, timeout).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, timeout: Duration) -> Result<T> {
        debug!("GET {}", path);
        let resp = self
            .client
            .get(self.url(path))
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| map_send_error(e, timeout))?;
        Self::handle_response(resp, timeout).await
    }

    async fn handle_response<T: DeserializeOwned>(
        resp: reqwest::Response,
        timeout: Duration,
    ) -> Result<T> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::gateway(status.as_u16(), truncate(body.trim(), 200)));
        }
        let bytes = resp.bytes().await.map_err(|e| map_send_error(e, timeout))?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Classify a transport failure.
fn map_send_error(e: reqwest::Error, timeout: Duration) -> Error {
    if e.is_timeout() {
        Error::timeout(timeout.as_millis() as u64)
    } else if e.is_connect() {
        Error::GatewayUnreachable(e.to_string())
    } else {
        Error::Http(e)
    }
}

#[async_trait]
impl MemoryGateway for HttpGateway {
    async fn encode(&self, memory: &CandidateMemory) -> Result<EncodeResponse> {
        self.post("/memory/encode", memory, self.config.encode_timeout())
            .await
    }

    async fn recall(
        &self,
        query: &str,
        limit: usize,
        shards: Option<&[Shard]>,
    ) -> Result<Vec<RecalledMemory>> {
        let req = RecallRequest {
            query,
            limit,
            shards,
        };
        let envelope: RecallEnvelope = self
            .post("/memory/recall", &req, self.config.recall_timeout())
            .await?;
        Ok(match envelope {
            RecallEnvelope::Wrapped { memories } => memories,
            RecallEnvelope::Bare(memories) => memories,
        })
    }

    async fn health(&self) -> Result<GatewayHealth> {
        self.get("/health", self.config.health_timeout()).await
    }
}
