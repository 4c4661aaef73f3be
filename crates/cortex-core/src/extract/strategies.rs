//! Fact extraction strategies.
//!
//! Each strategy is a plain function over one [`Section`]. They run
//! independently over the same text and their output is pooled, so overlap
//! between strategies is expected and resolved later by dedup.

use regex::Regex;
use std::sync::LazyLock;

use super::sections::{is_fence, Section};
use crate::text::{collapse_whitespace, truncate};
use crate::types::{CandidateFact, Shard};

pub const MIN_KV_VALUE_CHARS: usize = 10;
pub const MIN_LIST_ITEM_CHARS: usize = 20;
pub const MAX_LIST_TRIGGER_CHARS: usize = 100;
pub const MIN_PARAGRAPH_CHARS: usize = 60;
pub const MAX_PARAGRAPH_CHARS: usize = 500;
pub const MAX_SENTENCE_CHARS: usize = 100;
pub const MIN_CODE_CHARS: usize = 10;
pub const MAX_CODE_CHARS: usize = 500;

/// Labels that annotate a document rather than state a fact.
const ADMIN_LABELS: &[&str] = &[
    "note",
    "notes",
    "example",
    "e.g",
    "todo",
    "tip",
    "warning",
    "status",
    "updated",
    "last updated",
    "created",
    "date",
    "tbd",
    "see also",
    "source",
];

/// `- **Label:** value`, `**Label**: value` or `Label: value`.
static KEY_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?:[-*+]\s+)?(?:\*\*([^*:\n]{1,40}?)(?::\*\*|\*\*\s*:)|([A-Za-z][A-Za-z0-9 _/&().'-]{0,39}):)\s+(.+?)\s*$",
    )
    .expect("key-value regex")
});

static BULLET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:[-*+]|\d{1,3}[.)])\s+(.+?)\s*$").expect("bullet regex")
});

static CHECKBOX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[[ xX]\]\s*").expect("checkbox regex"));

/// Something concrete enough in a list item to be worth remembering.
static LIST_SIGNAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Z][A-Za-z]+|\d|[$€£¥]|[/\\]|[a-z][a-z0-9+.-]*://|@")
        .expect("list signal regex")
});

static SENTENCE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?](?:\s|$)").expect("sentence regex"));

/// A function turning one section into candidate facts.
pub type StrategyFn = fn(&Section) -> Vec<CandidateFact>;

/// A named extraction strategy.
#[derive(Clone)]
pub struct Strategy {
    pub name: &'static str,
    pub extract: StrategyFn,
}

/// Ordered set of extraction strategies.
#[derive(Clone)]
pub struct StrategyRegistry {
    strategies: Vec<Strategy>,
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl StrategyRegistry {
    pub fn empty() -> Self {
        Self { strategies: Vec::new() }
    }

    /// Key-value, list-item, paragraph and code-block strategies.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register("key-value", key_value_facts);
        registry.register("list-item", list_item_facts);
        registry.register("paragraph", paragraph_facts);
        registry.register("code-block", code_block_facts);
        registry
    }

    pub fn register(&mut self, name: &'static str, extract: StrategyFn) {
        self.strategies.push(Strategy { name, extract });
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name).collect()
    }

    /// Run every strategy over the section and pool the results.
    pub fn run(&self, section: &Section) -> Vec<CandidateFact> {
        self.strategies
            .iter()
            .flat_map(|s| (s.extract)(section))
            .collect()
    }
}

/// Lines of a section body outside fenced code.
fn prose_lines(body: &str) -> Vec<&str> {
    let mut in_fence = false;
    let mut lines = Vec::new();
    for line in body.lines() {
        if is_fence(line) {
            in_fence = !in_fence;
            continue;
        }
        if !in_fence {
            lines.push(line);
        }
    }
    lines
}

/// Label and value of a key-value line, markdown emphasis stripped.
pub fn parse_key_value(line: &str) -> Option<(String, String)> {
    let caps = KEY_VALUE.captures(line)?;
    let label = caps.get(1).or_else(|| caps.get(2))?.as_str().trim();
    let value = caps.get(3)?.as_str().trim().trim_matches('*').trim();
    if label.is_empty() || value.is_empty() {
        return None;
    }
    Some((label.to_string(), value.to_string()))
}

fn is_admin_label(label: &str) -> bool {
    let lower = label.to_lowercase();
    ADMIN_LABELS.contains(&lower.trim_end_matches('.'))
}

fn bullet_text(line: &str) -> Option<&str> {
    BULLET.captures(line).and_then(|c| c.get(1)).map(|m| m.as_str())
}

/// `Label: value` lines become facts stated exactly as `Label: value`.
pub fn key_value_facts(section: &Section) -> Vec<CandidateFact> {
    prose_lines(&section.body)
        .into_iter()
        .filter_map(parse_key_value)
        .filter(|(label, value)| {
            !is_admin_label(label) && value.chars().count() >= MIN_KV_VALUE_CHARS
        })
        .map(|(label, value)| {
            let fact = format!("{}: {}", label, value);
            CandidateFact::new(fact.clone(), fact)
        })
        .collect()
}

/// Concrete bullet items become facts on their own.
pub fn list_item_facts(section: &Section) -> Vec<CandidateFact> {
    prose_lines(&section.body)
        .into_iter()
        .filter(|line| parse_key_value(line).is_none())
        .filter_map(bullet_text)
        .map(|item| CHECKBOX.replace(item, "").trim().to_string())
        .filter(|item| item.chars().count() >= MIN_LIST_ITEM_CHARS && LIST_SIGNAL.is_match(item))
        .map(|item| CandidateFact::new(truncate(&item, MAX_LIST_TRIGGER_CHARS), item))
        .collect()
}

fn first_sentence(text: &str) -> String {
    let sentence = match SENTENCE_END.find(text) {
        Some(m) => &text[..m.start() + 1],
        None => text,
    };
    truncate(sentence.trim(), MAX_SENTENCE_CHARS)
}

fn is_structural_block(block: &str) -> bool {
    block.lines().any(|l| is_fence(l) || l.trim_start().starts_with('|'))
}

fn is_list_block(block: &str) -> bool {
    block
        .lines()
        .filter(|l| !l.trim().is_empty())
        .all(|l| bullet_text(l).is_some() || parse_key_value(l).is_some())
}

/// Blank-line separated blocks outside fenced code. A fence closes the
/// block before it and its contents belong to no block.
fn paragraph_blocks(body: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut in_fence = false;
    for line in body.lines() {
        if is_fence(line) {
            in_fence = !in_fence;
        } else if !in_fence && !line.trim().is_empty() {
            current.push(line);
            continue;
        }
        if !current.is_empty() {
            blocks.push(current.join("\n"));
            current.clear();
        }
    }
    if !current.is_empty() {
        blocks.push(current.join("\n"));
    }
    blocks
}

/// Prose paragraphs, keyed by the section label and their first sentence.
pub fn paragraph_facts(section: &Section) -> Vec<CandidateFact> {
    paragraph_blocks(&section.body)
        .iter()
        .map(|block| block.trim())
        .filter(|block| block.chars().count() >= MIN_PARAGRAPH_CHARS)
        .filter(|block| !is_structural_block(block) && !is_list_block(block))
        .map(|block| {
            let paragraph = collapse_whitespace(block);
            let trigger = format!("{}: {}", section.label, first_sentence(&paragraph));
            CandidateFact::new(trigger, truncate(&paragraph, MAX_PARAGRAPH_CHARS))
        })
        .collect()
}

/// Fenced code blocks, always procedural.
///
/// The nearest preceding prose line captions the block.
pub fn code_block_facts(section: &Section) -> Vec<CandidateFact> {
    let mut facts = Vec::new();
    let mut previous: Option<&str> = None;
    let mut open: Option<(String, Option<&str>, Vec<&str>)> = None;

    for line in section.body.lines() {
        if is_fence(line) {
            match open.take() {
                Some((lang, caption, code)) => {
                    let code = code.join("\n");
                    let len = code.trim().chars().count();
                    if (MIN_CODE_CHARS..=MAX_CODE_CHARS).contains(&len) {
                        let trigger = match caption {
                            Some(c) => truncate(c.trim_end_matches(':').trim(), MAX_SENTENCE_CHARS),
                            None => format!("{} code example", section.label),
                        };
                        let content = format!("```{}\n{}\n```", lang, code.trim_end());
                        facts.push(CandidateFact::new(trigger, content).with_shard(Shard::Procedural));
                    }
                }
                None => {
                    let lang = line.trim().trim_start_matches(['`', '~']).trim().to_string();
                    open = Some((lang, previous, Vec::new()));
                }
            }
            previous = None;
            continue;
        }
        match open.as_mut() {
            Some((_, _, code)) => code.push(line),
            None if line.trim().is_empty() => {}
            // List items describe themselves, not the block after them.
            None if bullet_text(line).is_some() => previous = None,
            None => previous = Some(line.trim()),
        }
    }
    facts
}
