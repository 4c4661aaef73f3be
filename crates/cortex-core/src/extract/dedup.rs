//! Local near-duplicate collapse.
//!
//! Runs over one file's pooled facts before anything is sent to the gateway.
//! When two facts collide the one with more content survives, whichever was
//! extracted first.

use tracing::debug;

use crate::config::ExtractionConfig;
use crate::text::{jaccard, normalized_key};
use crate::types::CandidateFact;

/// Cap on the normalized exact-duplicate key.
pub const DEDUP_KEY_CHARS: usize = 200;

/// Similarity thresholds for near-duplicate detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DedupThresholds {
    pub trigger: f64,
    pub content: f64,
}

impl Default for DedupThresholds {
    fn default() -> Self {
        Self::from(&ExtractionConfig::default())
    }
}

impl From<&ExtractionConfig> for DedupThresholds {
    fn from(config: &ExtractionConfig) -> Self {
        Self {
            trigger: config.trigger_similarity,
            content: config.content_similarity,
        }
    }
}

impl DedupThresholds {
    pub fn is_near_duplicate(&self, a: &CandidateFact, b: &CandidateFact) -> bool {
        jaccard(&a.trigger, &b.trigger) >= self.trigger
            || jaccard(&a.content, &b.content) >= self.content
    }
}

/// Collapse exact and near-duplicate facts, keeping the longer content.
pub fn dedupe(facts: Vec<CandidateFact>, thresholds: DedupThresholds) -> Vec<CandidateFact> {
    let mut kept: Vec<CandidateFact> = Vec::with_capacity(facts.len());
    let mut keys: Vec<String> = Vec::with_capacity(facts.len());

    for fact in facts {
        let key = normalized_key(&fact.content, DEDUP_KEY_CHARS);
        let existing = keys
            .iter()
            .position(|k| *k == key)
            .or_else(|| kept.iter().position(|k| thresholds.is_near_duplicate(k, &fact)));

        match existing {
            None => {
                kept.push(fact);
                keys.push(key);
            }
            Some(i) if fact.content_len() > kept[i].content_len() => {
                debug!(replaced = %kept[i].trigger, by = %fact.trigger, "Longer duplicate replaces fact");
                kept[i] = fact;
                keys[i] = key;
            }
            Some(i) => {
                debug!(dropped = %fact.trigger, kept = %kept[i].trigger, "Duplicate fact dropped");
            }
        }
    }

    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fact(trigger: &str, content: &str) -> CandidateFact {
        CandidateFact::new(trigger, content)
    }

    #[test]
    fn test_longer_wins_regardless_of_order() {
        let short = fact("Deploy target", "Deploys go to fly.io");
        let long = fact("Deploy target", "Deploys go to fly.io from the main branch via CI");

        let forward = dedupe(vec![short.clone(), long.clone()], DedupThresholds::default());
        let backward = dedupe(vec![long.clone(), short], DedupThresholds::default());

        assert_eq!(forward, vec![long.clone()]);
        assert_eq!(backward, vec![long]);
    }

    #[test]
    fn test_exact_duplicates_collapse() {
        let facts = vec![
            fact("a", "Name:   Alice Smith"),
            fact("completely different trigger", "name: alice smith"),
        ];
        assert_eq!(dedupe(facts, DedupThresholds::default()).len(), 1);
    }

    #[test]
    fn test_content_similarity_alone_collapses() {
        let facts = vec![
            fact("Stack", "The backend is Rust with axum and Postgres"),
            fact("Infra notes", "The backend is Rust with axum and Postgres today"),
        ];
        let kept = dedupe(facts, DedupThresholds::default());
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].trigger, "Infra notes");
    }

    #[test]
    fn test_distinct_facts_survive() {
        let facts = vec![
            fact("Name: Alice Smith", "Name: Alice Smith"),
            fact("Timezone: Europe/Lisbon", "Timezone: Europe/Lisbon"),
            fact("Company: Acme Robotics", "Company: Acme Robotics"),
        ];
        assert_eq!(dedupe(facts, DedupThresholds::default()).len(), 3);
    }

    #[test]
    fn test_thresholds_are_configurable() {
        let facts = vec![
            fact("Stack", "The backend is Rust with axum and Postgres"),
            fact("Infra notes", "The backend is Rust with axum and Postgres today"),
        ];
        let strict = DedupThresholds {
            trigger: 1.1,
            content: 1.1,
        };
        assert_eq!(dedupe(facts, strict).len(), 2);
    }
}
