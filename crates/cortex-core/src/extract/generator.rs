//! Text generation seam for delegated extraction.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::types::{CandidateFact, Shard};

/// A service that completes a prompt with free text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Instructions sent ahead of every document.
pub const EXTRACTION_INSTRUCTIONS: &str = "You extract durable facts from markdown notes. \
Reply with ONLY a JSON array. Each element is an object with \"trigger\" (a short question or \
phrase that should recall the fact), \"content\" (the self-contained fact) and optionally \
\"shard\" (one of \"episodic\", \"semantic\", \"procedural\"). Skip formatting, boilerplate and \
anything that is not a fact.";

/// Prompt asking for the facts in one document.
pub fn extraction_prompt(text: &str, file_label: &str, shard_hint: Option<Shard>) -> String {
    let hint = match shard_hint.filter(Shard::is_concrete) {
        Some(shard) => format!("Most facts in this file are {}.\n", shard),
        None => String::new(),
    };
    format!(
        "{}\n\nFile: {}\n{}\n---\n{}\n---",
        EXTRACTION_INSTRUCTIONS, file_label, hint, text
    )
}

fn non_blank(entry: &Value, key: &str) -> Option<String> {
    entry
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Facts from a generator reply.
///
/// Parses the span from the first `[` to the last `]`, so surrounding prose
/// or code fences are tolerated. Entries with a blank trigger or content are
/// dropped. Anything unparseable yields an empty list.
pub fn parse_fact_array(reply: &str) -> Vec<CandidateFact> {
    let (Some(start), Some(end)) = (reply.find('['), reply.rfind(']')) else {
        return Vec::new();
    };
    if end <= start {
        return Vec::new();
    }
    let Ok(Value::Array(entries)) = serde_json::from_str::<Value>(&reply[start..=end]) else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| {
            let trigger = non_blank(entry, "trigger")?;
            let content = non_blank(entry, "content")?;
            let fact = CandidateFact::new(trigger, content);
            match non_blank(entry, "shard").and_then(|s| s.parse::<Shard>().ok()) {
                Some(shard) if shard.is_concrete() => Some(fact.with_shard(shard)),
                _ => Some(fact),
            }
        })
        .collect()
}
