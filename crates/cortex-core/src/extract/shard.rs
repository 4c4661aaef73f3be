//! Heuristic shard assignment for extracted facts.

use regex::Regex;
use std::sync::LazyLock;

use crate::types::Shard;

static PROCEDURAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)```|\b(?:how to|step|steps|workflow|process|procedure|rule|rules|always|never|must|command|commands|run|install|deploy|configure|setup|set up|usage|script|checklist)\b",
    )
    .expect("procedural regex")
});

static EPISODIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)\b\d{4}-\d{2}-\d{2}\b",
        r"|\b\d{1,2}/\d{1,2}/\d{2,4}\b",
        r"|\b(?:january|february|march|april|june|july|august|september|october|november|december)\b",
        r"|\b(?:jan|feb|mar|apr|jun|jul|aug|sept?|oct|nov|dec)\.?\s+\d",
        r"|\bmay\s+\d",
        r"|\b(?:yesterday|today|tomorrow|tonight|recently|ago)\b",
        r"|\b(?:last|next|this)\s+(?:week|month|year|morning|night|quarter)\b",
    ))
    .expect("episodic regex")
});

/// Pick a shard for a fact.
///
/// A concrete hint always wins. Otherwise procedural vocabulary is checked
/// before dates, so a how-to that mentions a date stays procedural.
pub fn classify_shard(trigger: &str, content: &str, hint: Option<Shard>) -> Shard {
    if let Some(hint) = hint.filter(Shard::is_concrete) {
        return hint;
    }
    let text = format!("{}\n{}", trigger, content);
    if PROCEDURAL.is_match(&text) {
        Shard::Procedural
    } else if EPISODIC.is_match(&text) {
        Shard::Episodic
    } else {
        Shard::Semantic
    }
}
