//! Markdown knowledge extraction.
//!
//! Turns free-form workspace markdown into atomic candidate facts:
//!
//! 1. Split the document at headings ([`split_sections`]).
//! 2. Run every registered strategy over each long-enough section and pool
//!    the results ([`StrategyRegistry`]).
//! 3. Collapse near-duplicates, longer content winning ([`dedupe`]).
//! 4. Assign a shard to every surviving fact ([`classify_shard`]).
//!
//! [`synthesize`] adds role-specific summary facts on top, and the
//! [`FactExtractor`] variants choose between local extraction and a
//! delegated text-generation service.

mod dedup;
mod extractor;
mod generator;
mod sections;
mod shard;
mod strategies;
mod synthesis;

#[cfg(feature = "client")]
mod chat;

pub use dedup::*;
pub use extractor::*;
pub use generator::*;
pub use sections::*;
pub use shard::*;
pub use strategies::*;
pub use synthesis::*;

#[cfg(feature = "client")]
pub use chat::ChatCompletionsGenerator;

use tracing::debug;

use crate::config::ExtractionConfig;
use crate::types::{CandidateFact, Shard};

/// Extract facts from one document with the built-in strategies.
pub fn extract_facts(
    text: &str,
    file_label: &str,
    shard_hint: Option<Shard>,
    config: &ExtractionConfig,
) -> Vec<CandidateFact> {
    extract_with(&StrategyRegistry::builtin(), text, file_label, shard_hint, config)
}

/// Extract facts from one document with a specific strategy set.
pub fn extract_with(
    strategies: &StrategyRegistry,
    text: &str,
    file_label: &str,
    shard_hint: Option<Shard>,
    config: &ExtractionConfig,
) -> Vec<CandidateFact> {
    let pooled: Vec<CandidateFact> = split_sections(text, file_label)
        .iter()
        .filter(|s| s.len() >= config.min_section_chars)
        .flat_map(|s| strategies.run(s))
        .collect();
    debug!(file = file_label, pooled = pooled.len(), "Strategies finished");
    finalize(pooled, shard_hint, config)
}

/// Dedupe pooled facts and give each one a shard.
///
/// A shard already set on a fact (code blocks) is kept.
pub fn finalize(
    facts: Vec<CandidateFact>,
    shard_hint: Option<Shard>,
    config: &ExtractionConfig,
) -> Vec<CandidateFact> {
    dedupe(facts, DedupThresholds::from(config))
        .into_iter()
        .map(|mut fact| {
            let shard = fact
                .shard
                .unwrap_or_else(|| classify_shard(&fact.trigger, &fact.content, shard_hint));
            fact.shard = Some(shard);
            fact
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(text: &str) -> Vec<CandidateFact> {
        extract_facts(text, "USER.md", None, &ExtractionConfig::default())
    }

    #[test]
    fn test_bold_label_in_own_section() {
        let facts = extract("## Role\n**Role:** Backend Engineer");
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].trigger, "Role: Backend Engineer");
        assert_eq!(facts[0].content, "Role: Backend Engineer");
    }

    #[test]
    fn test_plain_key_value_content_is_exact() {
        let facts = extract("# About\n\nName: Alice Smith\nShe works remotely most days.");
        assert!(facts.iter().any(|f| f.content == "Name: Alice Smith"));
    }

    #[test]
    fn test_short_sections_skipped() {
        assert!(extract("## A\nName: Alice Smith").is_empty());
    }

    #[test]
    fn test_every_fact_has_shard() {
        let doc = "# Ops\n\nDeploy with the release script:\n\n```bash\n./scripts/release.sh prod\n```\n\n- Launched the public beta in March 2024\n- Prefers Postgres over MySQL for new services";
        let facts = extract(doc);
        assert!(!facts.is_empty());
        assert!(facts.iter().all(|f| f.shard.is_some()));

        let code = facts.iter().find(|f| f.content.starts_with("```bash")).unwrap();
        assert_eq!(code.shard, Some(Shard::Procedural));
        let beta = facts.iter().find(|f| f.content.contains("public beta")).unwrap();
        assert_eq!(beta.shard, Some(Shard::Episodic));
        let pg = facts.iter().find(|f| f.content.contains("Postgres")).unwrap();
        assert_eq!(pg.shard, Some(Shard::Semantic));
    }

    #[test]
    fn test_hint_applies_to_unforced_facts() {
        let doc = "# Log\n\n- Fixed the flaky Redis connection test\n\n```sh\nredis-cli ping\n```";
        let facts = extract_facts(doc, "2024-05-01.md", Some(Shard::Episodic), &ExtractionConfig::default());
        let item = facts.iter().find(|f| f.content.contains("Redis connection")).unwrap();
        assert_eq!(item.shard, Some(Shard::Episodic));
        let code = facts.iter().find(|f| f.content.contains("redis-cli")).unwrap();
        assert_eq!(code.shard, Some(Shard::Procedural));
    }

    #[test]
    fn test_overlapping_strategies_collapse() {
        let doc = "# Notes\n\nHosting: the production database lives on a dedicated Hetzner box.\nBackups run nightly to object storage.";
        let facts = extract(doc);
        assert_eq!(facts.len(), 1);
        assert!(facts[0].content.ends_with("Backups run nightly to object storage."));
    }
}
