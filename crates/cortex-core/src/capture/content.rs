//! Memory payloads for captured tool calls.
//!
//! Failures become `failure-memory` entries naming what broke and, where a
//! known remedy exists, a suggested alternative. Novel successes become
//! `execution-pattern` entries recording what worked.

use regex::Regex;
use serde_json::json;
use std::sync::LazyLock;

use super::classifier::first_failure_line;
use crate::text::{collapse_whitespace, truncate};
use crate::types::{CandidateMemory, MotivationDelta, Shard, ToolCallRecord};

pub const MAX_COMMAND_CHARS: usize = 100;
pub const MAX_URL_CHARS: usize = 100;
pub const MAX_ERROR_CHARS: usize = 150;
pub const MAX_PREVIEW_CHARS: usize = 100;

/// Context `source` tag for memories produced by auto-capture.
pub const CAPTURE_SOURCE: &str = "auto-capture";
pub const FAILURE_TAG: &str = "failure-memory";
pub const PATTERN_TAG: &str = "execution-pattern";

const SHELL_TOOLS: &[&str] = &["exec", "bash", "shell"];
const FETCH_TOOLS: &[&str] = &["web_fetch", "fetch"];
const FILE_TOOLS: &[&str] = &["read", "write", "edit", "exec", "bash", "shell"];

/// A known remedy for a class of failure.
struct Suggestion {
    /// Tools the remedy applies to; empty means any tool.
    tools: &'static [&'static str],
    /// Only applies when the command starts with one of these programs.
    programs: &'static [&'static str],
    pattern: Regex,
    advise: fn(&ToolCallRecord, &str) -> String,
}

impl Suggestion {
    fn new(
        tools: &'static [&'static str],
        programs: &'static [&'static str],
        pattern: &str,
        advise: fn(&ToolCallRecord, &str) -> String,
    ) -> Option<Self> {
        Regex::new(pattern).ok().map(|pattern| Self {
            tools,
            programs,
            pattern,
            advise,
        })
    }

    fn matches(&self, record: &ToolCallRecord, text: &str) -> bool {
        if !self.tools.is_empty() && !self.tools.contains(&record.tool.as_str()) {
            return false;
        }
        if !self.programs.is_empty() {
            let program = command_program(record).unwrap_or_default();
            if !self.programs.contains(&program.as_str()) {
                return false;
            }
        }
        self.pattern.is_match(text)
    }
}

static SUGGESTIONS: LazyLock<Vec<Suggestion>> = LazyLock::new(|| {
    [
        Suggestion::new(
            SHELL_TOOLS,
            &[],
            r"(?i)permission denied \(publickey|host key verification failed",
            |_, _| remote_exec_advice(),
        ),
        Suggestion::new(
            SHELL_TOOLS,
            &["ssh", "scp", "rsync", "sftp"],
            r"(?i)permission denied",
            |_, _| remote_exec_advice(),
        ),
        Suggestion::new(SHELL_TOOLS, &[], r"(?i)command not found|not installed", |record, text| {
            let binary = missing_binary(text)
                .or_else(|| command_program(record))
                .unwrap_or_else(|| "required".to_string());
            format!(
                "the `{}` binary is not installed on this host; install it or use an available equivalent",
                binary
            )
        }),
        Suggestion::new(FETCH_TOOLS, &[], r"(?i)\btimed out\b|\btimeout\b", |_, _| {
            "the site did not answer a direct fetch; use the browser tool to load it in a real browser".to_string()
        }),
        Suggestion::new(
            FETCH_TOOLS,
            &[],
            r"(?i)\b(?:401|403|429)\b|forbidden|too many requests|captcha",
            |_, _| {
                "the site blocks automated fetches; use the browser tool or an official API instead".to_string()
            },
        ),
        Suggestion::new(&[], &[], r"(?i)connection refused", |_, _| {
            "nothing is listening at the target address; check the service is running and the host and port are right".to_string()
        }),
        Suggestion::new(FILE_TOOLS, &[], r"(?i)no such file or directory|enoent", |_, _| {
            "the path does not exist; list the parent directory to confirm the correct path first".to_string()
        }),
        Suggestion::new(SHELL_TOOLS, &[], r"(?i)permission denied", |_, _| {
            "check file permissions or ownership; avoid sudo unless it is configured for non-interactive use".to_string()
        }),
    ]
    .into_iter()
    .flatten()
    .collect()
});

static MISSING_BINARY: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)([\w.+-]+): command not found",
        r"(?i)command not found: ([\w.+-]+)",
        r"(?i)([\w.+-]+): not found",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

fn remote_exec_advice() -> String {
    "direct SSH/SCP is not authorized from this host; run the command on the remote machine through the remote execution tool (nodes run) instead".to_string()
}

fn missing_binary(text: &str) -> Option<String> {
    MISSING_BINARY
        .iter()
        .find_map(|re| re.captures(text))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn command_program(record: &ToolCallRecord) -> Option<String> {
    record
        .arg_str(&["command", "cmd"])
        .and_then(|c| c.split_whitespace().next())
        .map(|p| p.rsplit('/').next().unwrap_or(p).to_string())
}

/// Look up a suggested alternative for a failed call.
pub fn suggest_alternative(record: &ToolCallRecord, error_text: &str) -> Option<String> {
    SUGGESTIONS
        .iter()
        .find(|s| s.matches(record, error_text))
        .map(|s| (s.advise)(record, error_text))
}

/// The single most informative line of a failure.
///
/// The first line matching a failure pattern in the result, then in the
/// error text. Without one, the last non-blank line of the error text, else
/// of the result.
pub fn key_error_line(record: &ToolCallRecord) -> String {
    let result = record.result_text();
    let error = record.error_text().unwrap_or("");
    first_failure_line(result)
        .or_else(|| first_failure_line(error))
        .or_else(|| last_line(error))
        .or_else(|| last_line(result))
        .unwrap_or("unknown error")
        .to_string()
}

fn last_line(text: &str) -> Option<&str> {
    text.lines().map(str::trim).rfind(|l| !l.is_empty())
}

/// Result and error text together, for remedy lookup.
pub fn failure_text(record: &ToolCallRecord) -> String {
    [record.result_text(), record.error_text().unwrap_or("")]
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Key arguments of a call, rendered for memory text.
pub fn describe_args(record: &ToolCallRecord) -> Vec<String> {
    let mut parts = Vec::new();
    if let Some(command) = record.arg_str(&["command", "cmd"]) {
        parts.push(format!(
            "command `{}`",
            truncate(&collapse_whitespace(command), MAX_COMMAND_CHARS)
        ));
    }
    if let Some(url) = record.arg_str(&["url", "href"]) {
        parts.push(format!("url {}", truncate(url, MAX_URL_CHARS)));
    }
    if let Some(action) = record.arg_str(&["action"]) {
        parts.push(format!("action {}", action));
    }
    if let Some(target) = record.arg_str(&["target"]) {
        parts.push(format!("target {}", truncate(target, MAX_URL_CHARS)));
    }
    if let Some(path) = record.arg_str(&["path", "file_path", "filePath"]) {
        parts.push(format!("path {}", truncate(path, MAX_URL_CHARS)));
    }
    parts
}

/// Short query text describing a call, used for recall.
pub fn describe_call(record: &ToolCallRecord) -> String {
    let args = describe_args(record);
    if args.is_empty() {
        record.tool.clone()
    } else {
        format!("{} {}", record.tool, args.join(" "))
    }
}

/// Build the memory for a failed call.
pub fn build_failure_memory(
    record: &ToolCallRecord,
    signature: &str,
    dedup_threshold: f64,
) -> CandidateMemory {
    let error_line = truncate(&key_error_line(record), MAX_ERROR_CHARS);
    let suggestion = suggest_alternative(record, &failure_text(record));

    let args = describe_args(record);
    let mut content = format!("{} failed", record.tool);
    if !args.is_empty() {
        content.push_str(&format!(" ({})", args.join(", ")));
    }
    content.push_str(&format!(": {}", error_line));
    if let Some(ref alternative) = suggestion {
        content.push_str(&format!(". Suggested alternative: {}", alternative));
    }

    CandidateMemory {
        event: format!("{} failure", signature),
        content,
        shard: Shard::Procedural,
        context: json!({
            "source": CAPTURE_SOURCE,
            "tags": [FAILURE_TAG],
            "tool": record.tool,
            "signature": signature,
            "outcome": "failure",
            "durationMs": record.duration_ms,
            "suggestion": suggestion,
        }),
        motivation_delta: MotivationDelta::new(0.3, 0.2, 0.0),
        dedup_threshold,
    }
}

/// Build the memory for a first or second success of a pattern.
pub fn build_novel_memory(
    record: &ToolCallRecord,
    signature: &str,
    dedup_threshold: f64,
) -> CandidateMemory {
    let args = describe_args(record);
    let mut content = format!("{} succeeded", record.tool);
    if !args.is_empty() {
        content.push_str(&format!(" with {}", args.join(", ")));
    }
    if let Some(ms) = record.duration_ms {
        content.push_str(&format!(" in {}ms", ms));
    }
    let preview = collapse_whitespace(record.result_text());
    if !preview.is_empty() {
        content.push_str(&format!(". Result: {}", truncate(&preview, MAX_PREVIEW_CHARS)));
    }

    CandidateMemory {
        event: format!("{} pattern", signature),
        content,
        shard: Shard::Procedural,
        context: json!({
            "source": CAPTURE_SOURCE,
            "tags": [PATTERN_TAG],
            "tool": record.tool,
            "signature": signature,
            "outcome": "novel",
            "durationMs": record.duration_ms,
        }),
        motivation_delta: MotivationDelta::new(0.0, 0.2, 0.1),
        dedup_threshold,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exec(command: &str) -> ToolCallRecord {
        ToolCallRecord::new("exec", json!({"command": command}))
    }

    #[test]
    fn test_scp_permission_denied_suggests_remote_exec() {
        let record = exec("scp file host:/tmp").with_error("Permission denied (publickey)");
        let memory = build_failure_memory(&record, "exec:scp", 0.85);
        assert!(memory.content.contains("Permission denied (publickey)"));
        assert!(memory.content.contains("remote execution tool"));
        assert_eq!(memory.context["tags"][0], FAILURE_TAG);
        assert_eq!(memory.context["source"], CAPTURE_SOURCE);
        assert!(memory.motivation_delta.protect > memory.motivation_delta.serve);
    }

    #[test]
    fn test_missing_binary_is_named() {
        let record = exec("jq .name data.json").with_result("bash: jq: command not found");
        let memory = build_failure_memory(&record, "exec:jq", 0.85);
        assert!(memory.content.contains("`jq` binary is not installed"));
    }

    #[test]
    fn test_generic_error_defers_to_result_output() {
        let record = exec("jq .name data.json")
            .with_error("Command exited with code 127")
            .with_result("bash: jq: command not found");
        assert_eq!(key_error_line(&record), "bash: jq: command not found");
        let memory = build_failure_memory(&record, "exec:jq", 0.85);
        assert!(memory.content.contains(": bash: jq: command not found"));
        assert!(memory.content.contains("`jq` binary is not installed"));

        let record = exec("make").with_error("exit status 2").with_result("Building...\ndone");
        assert_eq!(key_error_line(&record), "exit status 2");
    }

    #[test]
    fn test_fetch_timeout_suggests_browser() {
        let record = ToolCallRecord::new("web_fetch", json!({"url": "https://slow.example"}))
            .with_error("request timed out");
        let suggestion = suggest_alternative(&record, record.error_text().unwrap());
        assert!(suggestion.unwrap().contains("browser tool"));
    }

    #[test]
    fn test_no_suggestion_for_unknown_failure() {
        let record = exec("make").with_error("make: *** [all] Error 2");
        assert!(suggest_alternative(&record, "make: *** [all] Error 2").is_none());
        let memory = build_failure_memory(&record, "exec:make", 0.85);
        assert!(!memory.content.contains("Suggested alternative"));
    }

    #[test]
    fn test_error_truncation_boundary() {
        let at_cap = "x".repeat(150);
        let memory = build_failure_memory(&exec("run").with_error(at_cap.clone()), "exec:run", 0.85);
        assert!(memory.content.ends_with(&format!(": {}", at_cap)));

        let over_cap = "x".repeat(151);
        let memory = build_failure_memory(&exec("run").with_error(over_cap), "exec:run", 0.85);
        assert!(memory.content.ends_with(&format!(": {}...", "x".repeat(150))));
    }

    #[test]
    fn test_key_error_line_prefers_failure_line() {
        let record = exec("git push").with_result(
            "Enumerating objects: 5\nremote: Permission denied to bot\nfatal: unable to access",
        ).with_error("exit status 128");
        assert_eq!(key_error_line(&record), "remote: Permission denied to bot");

        let record = exec("git push")
            .with_result("Enumerating objects: 5\nremote: Permission denied to bot\ndone");
        assert_eq!(key_error_line(&record), "remote: Permission denied to bot");

        let record = exec("weird").with_error("first\nsecond\n\n");
        assert_eq!(key_error_line(&record), "second");
    }

    #[test]
    fn test_novel_memory_sentence() {
        let record = exec("curl https://x").with_result("200 OK").with_duration(35);
        let memory = build_novel_memory(&record, "exec:curl", 0.9);
        assert_eq!(
            memory.content,
            "exec succeeded with command `curl https://x` in 35ms. Result: 200 OK"
        );
        assert_eq!(memory.context["tags"][0], PATTERN_TAG);
        assert_eq!(memory.context["signature"], "exec:curl");
        assert!(memory.motivation_delta.serve > memory.motivation_delta.grow);
        assert_eq!(memory.dedup_threshold, 0.9);
    }

    #[test]
    fn test_novel_memory_truncates_preview_and_command() {
        let long_command = format!("echo {}", "a".repeat(200));
        let record = exec(&long_command).with_result("b".repeat(300));
        let memory = build_novel_memory(&record, "exec:echo", 0.9);
        assert!(memory.content.contains(&format!("{}...", "b".repeat(100))));
        assert!(!memory.content.contains(&"b".repeat(101)));
        assert!(!memory.content.contains(&"a".repeat(100)));
    }

    #[test]
    fn test_describe_call() {
        let record = ToolCallRecord::new("browser", json!({"action": "open", "target": "https://x"}));
        assert_eq!(describe_call(&record), "browser action open target https://x");
        assert_eq!(describe_call(&ToolCallRecord::new("tts", json!({}))), "tts");
    }
}
