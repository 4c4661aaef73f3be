//! Local and delegated fact extractors.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use super::generator::{extraction_prompt, parse_fact_array, TextGenerator};
use super::strategies::StrategyRegistry;
use super::{extract_with, finalize};
use crate::config::ExtractionConfig;
use crate::types::{CandidateFact, Shard};

/// Turns one document into deduplicated, shard-assigned facts.
///
/// Extraction never fails: implementations degrade to fewer facts.
#[async_trait]
pub trait FactExtractor: Send + Sync {
    fn name(&self) -> &'static str;

    async fn extract(&self, text: &str, file_label: &str, shard_hint: Option<Shard>)
        -> Vec<CandidateFact>;
}

/// Deterministic regex-based extraction.
#[derive(Clone, Default)]
pub struct LocalExtractor {
    strategies: StrategyRegistry,
    config: ExtractionConfig,
}

impl LocalExtractor {
    pub fn new(config: ExtractionConfig) -> Self {
        Self {
            strategies: StrategyRegistry::builtin(),
            config,
        }
    }

    pub fn with_strategies(strategies: StrategyRegistry, config: ExtractionConfig) -> Self {
        Self { strategies, config }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    pub fn extract_sync(&self, text: &str, file_label: &str, shard_hint: Option<Shard>) -> Vec<CandidateFact> {
        extract_with(&self.strategies, text, file_label, shard_hint, &self.config)
    }
}

#[async_trait]
impl FactExtractor for LocalExtractor {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn extract(&self, text: &str, file_label: &str, shard_hint: Option<Shard>) -> Vec<CandidateFact> {
        self.extract_sync(text, file_label, shard_hint)
    }
}

/// Extraction delegated to a text generator, falling back to local
/// extraction when the generator fails or returns nothing usable.
pub struct DelegatedExtractor {
    generator: Arc<dyn TextGenerator>,
    local: LocalExtractor,
}

impl DelegatedExtractor {
    pub fn new(generator: Arc<dyn TextGenerator>, local: LocalExtractor) -> Self {
        Self { generator, local }
    }
}

#[async_trait]
impl FactExtractor for DelegatedExtractor {
    fn name(&self) -> &'static str {
        "swarm"
    }

    async fn extract(&self, text: &str, file_label: &str, shard_hint: Option<Shard>) -> Vec<CandidateFact> {
        let prompt = extraction_prompt(text, file_label, shard_hint);
        let facts = match self.generator.generate(&prompt).await {
            Ok(reply) => parse_fact_array(&reply),
            Err(e) => {
                warn!(
                    file = file_label,
                    generator = self.generator.name(),
                    "Delegated extraction failed, using local: {}",
                    e
                );
                return self.local.extract_sync(text, file_label, shard_hint);
            }
        };

        if facts.is_empty() {
            warn!(file = file_label, "Delegated extraction returned no facts, using local");
            return self.local.extract_sync(text, file_label, shard_hint);
        }

        debug!(file = file_label, facts = facts.len(), "Delegated extraction accepted");
        finalize(facts, shard_hint, self.local.config())
    }
}
