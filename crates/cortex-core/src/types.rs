//! Shared types for capture and migration.
//!
//! These types cross the crate boundary: the server deserializes
//! [`ToolCallRecord`]s from request bodies, the CLI prints
//! [`FileDescriptor`]s and [`CandidateFact`]s, and both hand
//! [`CandidateMemory`] values to the memory gateway.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

// ─────────────────────────────────────────────────────────────────────────────
// Tool Calls
// ─────────────────────────────────────────────────────────────────────────────

/// One tool execution outcome reported by the agent runtime.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallRecord {
    pub tool: String,
    #[serde(default)]
    pub args: serde_json::Value,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub duration_ms: Option<u64>,
}

impl ToolCallRecord {
    /// Create a record for a tool call with the given arguments.
    pub fn new(tool: impl Into<String>, args: serde_json::Value) -> Self {
        Self {
            tool: tool.into(),
            args,
            ..Default::default()
        }
    }

    pub fn with_result(mut self, result: impl Into<String>) -> Self {
        self.result = Some(result.into());
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// The error text, if the runtime reported one. Blank strings count as unset.
    pub fn error_text(&self) -> Option<&str> {
        self.error.as_deref().filter(|e| !e.trim().is_empty())
    }

    pub fn has_error(&self) -> bool {
        self.error_text().is_some()
    }

    pub fn result_text(&self) -> &str {
        self.result.as_deref().unwrap_or("")
    }

    /// Look up a string argument by any of the given keys.
    pub fn arg_str(&self, keys: &[&str]) -> Option<&str> {
        keys.iter()
            .find_map(|k| self.args.get(*k).and_then(|v| v.as_str()))
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Shards
// ─────────────────────────────────────────────────────────────────────────────

/// Memory category used by the gateway to bias recall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shard {
    Episodic,
    Semantic,
    Procedural,
    /// Hint-only value: the file mixes categories, classify per fact.
    Mixed,
}

impl Shard {
    pub fn as_str(&self) -> &'static str {
        match self {
            Shard::Episodic => "episodic",
            Shard::Semantic => "semantic",
            Shard::Procedural => "procedural",
            Shard::Mixed => "mixed",
        }
    }

    /// A hint that names a concrete shard (anything but `Mixed`).
    pub fn is_concrete(&self) -> bool {
        !matches!(self, Shard::Mixed)
    }
}

impl fmt::Display for Shard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Shard {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "episodic" => Ok(Shard::Episodic),
            "semantic" => Ok(Shard::Semantic),
            "procedural" => Ok(Shard::Procedural),
            "mixed" => Ok(Shard::Mixed),
            other => Err(format!("unknown shard: {}", other)),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Memories and Facts
// ─────────────────────────────────────────────────────────────────────────────

/// Drive weights attached to an encoded memory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MotivationDelta {
    pub protect: f64,
    pub serve: f64,
    pub grow: f64,
}

impl MotivationDelta {
    pub fn new(protect: f64, serve: f64, grow: f64) -> Self {
        Self {
            protect,
            serve,
            grow,
        }
    }
}

/// A memory ready to be submitted to the gateway's `encode` operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateMemory {
    pub event: String,
    pub content: String,
    pub shard: Shard,
    pub context: serde_json::Value,
    pub motivation_delta: MotivationDelta,
    pub dedup_threshold: f64,
}

/// An atomic fact extracted from a markdown document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateFact {
    pub trigger: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shard: Option<Shard>,
}

impl CandidateFact {
    pub fn new(trigger: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            trigger: trigger.into(),
            content: content.into(),
            shard: None,
        }
    }

    pub fn with_shard(mut self, shard: Shard) -> Self {
        self.shard = Some(shard);
        self
    }

    pub fn content_len(&self) -> usize {
        self.content.chars().count()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Workspace Files
// ─────────────────────────────────────────────────────────────────────────────

/// Role of a workspace file, used for priority and summary synthesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    /// Primary long-term memory file (MEMORY.md)
    Memory,
    /// Facts about the human user (USER.md)
    User,
    /// The agent's own identity (IDENTITY.md)
    Identity,
    /// Personality and behavior guidelines (SOUL.md)
    Soul,
    /// Operating rules and workflows (AGENTS.md)
    Agents,
    /// Tool and environment notes (TOOLS.md)
    Tools,
    /// Periodic checklists (HEARTBEAT.md)
    Heartbeat,
    /// Dated daily notes (memory/YYYY-MM-DD.md)
    DailyNote,
    /// Markdown from a conventional extra directory
    Note,
    /// A file named explicitly with `--file`
    Other,
}

impl FileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Memory => "memory",
            FileType::User => "user",
            FileType::Identity => "identity",
            FileType::Soul => "soul",
            FileType::Agents => "agents",
            FileType::Tools => "tools",
            FileType::Heartbeat => "heartbeat",
            FileType::DailyNote => "daily_note",
            FileType::Note => "note",
            FileType::Other => "other",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A migratable file found during workspace discovery.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDescriptor {
    pub path: PathBuf,
    pub relative_path: String,
    pub shard_hint: Shard,
    /// Lower numbers are processed and reported first.
    pub priority: u32,
    #[serde(rename = "type")]
    pub file_type: FileType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_deserializes_camel_case() {
        let record: ToolCallRecord = serde_json::from_value(serde_json::json!({
            "tool": "exec",
            "args": {"command": "ls -la"},
            "result": "total 0",
            "error": null,
            "durationMs": 42
        }))
        .unwrap();

        assert_eq!(record.tool, "exec");
        assert_eq!(record.duration_ms, Some(42));
        assert_eq!(record.arg_str(&["command"]), Some("ls -la"));
        assert!(!record.has_error());
    }

    #[test]
    fn test_blank_error_is_not_an_error() {
        let record = ToolCallRecord::new("exec", serde_json::json!({})).with_error("   ");
        assert!(!record.has_error());
        assert_eq!(record.error_text(), None);
    }

    #[test]
    fn test_shard_round_trips_through_str() {
        assert_eq!("Procedural".parse::<Shard>().unwrap(), Shard::Procedural);
        assert_eq!(Shard::Episodic.to_string(), "episodic");
        assert!("feelings".parse::<Shard>().is_err());
        assert!(!Shard::Mixed.is_concrete());
    }

    #[test]
    fn test_candidate_memory_serializes_gateway_shape() {
        let memory = CandidateMemory {
            event: "e".into(),
            content: "c".into(),
            shard: Shard::Semantic,
            context: serde_json::json!({"source": "test"}),
            motivation_delta: MotivationDelta::new(0.1, 0.2, 0.0),
            dedup_threshold: 0.9,
        };
        let value = serde_json::to_value(&memory).unwrap();
        assert_eq!(value["shard"], "semantic");
        assert_eq!(value["dedupThreshold"], 0.9);
        assert_eq!(value["motivationDelta"]["serve"], 0.2);
    }
}
