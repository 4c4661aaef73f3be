//! Signature generation for tool calls.
//!
//! A signature is a coarse grouping key: repeated runs of the same logical
//! operation map to one key even when incidental arguments differ, while
//! unrelated operations through the same tool stay apart.
//!
//! Rules live in a [`SignatureRegistry`] keyed by tool name. Tools without a
//! rule fall back to `tool:default`.

use serde_json::Value;
use std::sync::LazyLock;
use url::Url;

/// Derives the part after `tool:` from the call arguments.
pub type SignatureFn = fn(&Value) -> Option<String>;

/// A named signature strategy applied to a set of tools.
#[derive(Clone)]
pub struct SignatureRule {
    pub name: &'static str,
    pub tools: Vec<String>,
    pub derive: SignatureFn,
    /// Suffix used when `derive` finds nothing usable.
    pub sentinel: &'static str,
}

impl SignatureRule {
    pub fn new(
        name: &'static str,
        tools: &[&str],
        derive: SignatureFn,
        sentinel: &'static str,
    ) -> Self {
        Self {
            name,
            tools: tools.iter().map(|t| t.to_string()).collect(),
            derive,
            sentinel,
        }
    }

    fn applies_to(&self, tool: &str) -> bool {
        self.tools.iter().any(|t| t == tool)
    }
}

/// Registry of signature strategies.
#[derive(Clone)]
pub struct SignatureRegistry {
    rules: Vec<SignatureRule>,
}

impl Default for SignatureRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl SignatureRegistry {
    /// An empty registry: every tool maps to `tool:default`.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// The built-in rules for shell, fetch, file and action-style tools.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(SignatureRule::new(
            "command-prefix",
            &["exec", "bash", "shell"],
            command_prefix,
            "default",
        ));
        registry.register(SignatureRule::new(
            "url-host",
            &["web_fetch", "fetch"],
            url_host,
            "invalid-url",
        ));
        registry.register(SignatureRule::new(
            "file-extension",
            &["read", "write", "edit"],
            file_extension,
            "no-ext",
        ));
        registry.register(SignatureRule::new(
            "action-name",
            &["browser", "message", "nodes", "cron", "canvas", "gateway", "process"],
            action_name,
            "default",
        ));
        registry
    }

    /// Add a rule. Later rules take precedence for tools they share.
    pub fn register(&mut self, rule: SignatureRule) {
        self.rules.insert(0, rule);
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name).collect()
    }

    /// Compute the signature for a tool call. Total and deterministic.
    pub fn signature(&self, tool: &str, args: &Value) -> String {
        let tool = tool.trim();
        let suffix = match self.rules.iter().find(|r| r.applies_to(tool)) {
            Some(rule) => (rule.derive)(args).unwrap_or_else(|| rule.sentinel.to_string()),
            None => "default".to_string(),
        };
        format!("{}:{}", tool, suffix)
    }
}

static BUILTIN: LazyLock<SignatureRegistry> = LazyLock::new(SignatureRegistry::builtin);

/// Signature using the built-in rules.
pub fn signature(tool: &str, args: &Value) -> String {
    BUILTIN.signature(tool, args)
}

fn arg<'a>(args: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .find_map(|k| args.get(*k).and_then(|v| v.as_str()))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// First whitespace-delimited token of the command.
fn command_prefix(args: &Value) -> Option<String> {
    arg(args, &["command", "cmd"])
        .and_then(|c| c.split_whitespace().next())
        .map(String::from)
}

/// Host of the fetched URL.
fn url_host(args: &Value) -> Option<String> {
    let raw = arg(args, &["url", "href"])?;
    Url::parse(raw)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
}

/// Lower-cased extension of the target file.
fn file_extension(args: &Value) -> Option<String> {
    let path = arg(args, &["path", "file_path", "filePath", "file"])?;
    std::path::Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

fn action_name(args: &Value) -> Option<String> {
    arg(args, &["action"]).map(|a| a.to_lowercase())
}
