//! Configuration management for Cortex.
//!
//! Configuration is loaded from multiple sources with precedence:
//! 1. Command-line flags (applied by the binaries)
//! 2. Environment variables (BRAINDB_URL, CORTEX_BIND, CORTEX_SWARM_URL)
//! 3. Config file ($CORTEX_DIR/config.toml, default ~/.cortex/config.toml)
//! 4. Default values

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Result;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Memory gateway connection
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Auto-capture classification
    #[serde(default)]
    pub capture: CaptureConfig,

    /// Markdown extraction and local dedup
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Delegated ("swarm") extraction
    #[serde(default)]
    pub swarm: SwarmConfig,

    /// Capture server
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Base URL of the memory gateway
    #[serde(default = "default_gateway_url")]
    pub url: String,

    #[serde(default = "default_encode_timeout")]
    pub encode_timeout_secs: u64,

    #[serde(default = "default_recall_timeout")]
    pub recall_timeout_secs: u64,

    #[serde(default = "default_health_timeout")]
    pub health_timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            url: default_gateway_url(),
            encode_timeout_secs: default_encode_timeout(),
            recall_timeout_secs: default_recall_timeout(),
            health_timeout_secs: default_health_timeout(),
        }
    }
}

impl GatewayConfig {
    pub fn encode_timeout(&self) -> Duration {
        Duration::from_secs(self.encode_timeout_secs)
    }

    pub fn recall_timeout(&self) -> Duration {
        Duration::from_secs(self.recall_timeout_secs)
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_secs(self.health_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Tool names skipped on non-error outcomes before classification
    #[serde(default = "default_skip_tools")]
    pub skip_tools: Vec<String>,

    /// Minimum recall similarity that counts as an existing memory to reinforce
    #[serde(default = "default_recall_floor")]
    pub recall_similarity_floor: f64,

    /// Count added to each signature found during cache warm-up
    #[serde(default = "default_warm_boost")]
    pub warm_boost: u32,

    /// Maximum memories inspected during cache warm-up
    #[serde(default = "default_warm_limit")]
    pub warm_recall_limit: usize,

    #[serde(default = "default_failure_dedup")]
    pub failure_dedup_threshold: f64,

    #[serde(default = "default_novel_dedup")]
    pub novel_dedup_threshold: f64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            skip_tools: default_skip_tools(),
            recall_similarity_floor: default_recall_floor(),
            warm_boost: default_warm_boost(),
            warm_recall_limit: default_warm_limit(),
            failure_dedup_threshold: default_failure_dedup(),
            novel_dedup_threshold: default_novel_dedup(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Sections shorter than this (heading included) are not mined
    #[serde(default = "default_min_section")]
    pub min_section_chars: usize,

    /// Files whose trimmed content is shorter than this are skipped
    #[serde(default = "default_min_file")]
    pub min_file_chars: usize,

    /// Trigger Jaccard similarity at or above which two facts are near-duplicates
    #[serde(default = "default_trigger_similarity")]
    pub trigger_similarity: f64,

    /// Content Jaccard similarity at or above which two facts are near-duplicates
    #[serde(default = "default_content_similarity")]
    pub content_similarity: f64,

    /// Gateway-side dedup threshold sent with migrated facts
    #[serde(default = "default_migration_dedup")]
    pub migration_dedup_threshold: f64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_section_chars: default_min_section(),
            min_file_chars: default_min_file(),
            trigger_similarity: default_trigger_similarity(),
            content_similarity: default_content_similarity(),
            migration_dedup_threshold: default_migration_dedup(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwarmConfig {
    /// Use the delegated extractor by default
    #[serde(default)]
    pub enabled: bool,

    /// Base URL of an OpenAI-compatible text generation service
    #[serde(default = "default_swarm_url")]
    pub url: String,

    #[serde(default = "default_swarm_model")]
    pub model: String,

    /// Name of the environment variable holding the API key
    #[serde(default = "default_swarm_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_swarm_timeout")]
    pub timeout_secs: u64,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: default_swarm_url(),
            model: default_swarm_model(),
            api_key_env: default_swarm_key_env(),
            timeout_secs: default_swarm_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address for the capture server
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

// Default value functions
fn default_gateway_url() -> String {
    "http://127.0.0.1:3333".to_string()
}

fn default_encode_timeout() -> u64 {
    120
}

fn default_recall_timeout() -> u64 {
    30
}

fn default_health_timeout() -> u64 {
    5
}

fn default_skip_tools() -> Vec<String> {
    [
        "read",
        "session_status",
        "sessions_list",
        "sessions_history",
        "memory_search",
        "memory_get",
        "agents_list",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_recall_floor() -> f64 {
    0.6
}

fn default_warm_boost() -> u32 {
    3
}

fn default_warm_limit() -> usize {
    200
}

fn default_failure_dedup() -> f64 {
    0.85
}

fn default_novel_dedup() -> f64 {
    0.9
}

fn default_min_section() -> usize {
    30
}

fn default_min_file() -> usize {
    20
}

fn default_trigger_similarity() -> f64 {
    0.6
}

fn default_content_similarity() -> f64 {
    0.7
}

fn default_migration_dedup() -> f64 {
    0.88
}

fn default_swarm_url() -> String {
    "http://127.0.0.1:11434".to_string()
}

fn default_swarm_model() -> String {
    "llama3.1".to_string()
}

fn default_swarm_key_env() -> String {
    "CORTEX_SWARM_API_KEY".to_string()
}

fn default_swarm_timeout() -> u64 {
    90
}

fn default_bind() -> String {
    "127.0.0.1:4650".to_string()
}

impl Config {
    /// Cortex data directory: `$CORTEX_DIR` or `~/.cortex`
    pub fn data_dir() -> PathBuf {
        std::env::var("CORTEX_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".cortex")
            })
    }

    /// Default config file path
    pub fn default_path() -> PathBuf {
        Self::data_dir().join("config.toml")
    }

    /// Load configuration from the default path, then apply env overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::default_path())?;
        config.apply_env();
        Ok(config)
    }

    /// Load configuration from a specific file. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Apply environment variable overrides.
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("BRAINDB_URL") {
            if !url.trim().is_empty() {
                self.gateway.url = url.trim().to_string();
            }
        }
        if let Ok(bind) = std::env::var("CORTEX_BIND") {
            if !bind.trim().is_empty() {
                self.server.bind = bind.trim().to_string();
            }
        }
        if let Ok(url) = std::env::var("CORTEX_SWARM_URL") {
            if !url.trim().is_empty() {
                self.swarm.url = url.trim().to_string();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.gateway.encode_timeout_secs, 120);
        assert!(config.gateway.health_timeout_secs < config.gateway.encode_timeout_secs);
        assert_eq!(config.capture.recall_similarity_floor, 0.6);
        assert_eq!(config.capture.warm_boost, 3);
        assert_eq!(config.extraction.trigger_similarity, 0.6);
        assert_eq!(config.extraction.content_similarity, 0.7);
        assert!(config.capture.skip_tools.iter().any(|t| t == "memory_search"));
        assert!(!config.swarm.enabled);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&temp_dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:4650");
    }

    #[test]
    fn test_partial_file_keeps_section_defaults() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[gateway]\nurl = \"http://braindb:9000\"\n\n[extraction]\ncontent_similarity = 0.8\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.gateway.url, "http://braindb:9000");
        assert_eq!(config.gateway.encode_timeout_secs, 120);
        assert_eq!(config.extraction.content_similarity, 0.8);
        assert_eq!(config.extraction.trigger_similarity, 0.6);
        assert_eq!(config.capture.warm_boost, 3);
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[gateway\nurl = 1").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(crate::error::Error::Config(_))
        ));
    }
}
