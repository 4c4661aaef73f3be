//! Pattern cache warm-up.
//!
//! After a restart the pattern store is empty, so every known pattern would
//! be encoded as novel again. Warm-up recalls previously captured
//! execution-pattern memories and pre-seeds their signatures so they are
//! immediately treated as repeated.

use std::collections::HashSet;
use tracing::{info, warn};

use super::content::{CAPTURE_SOURCE, PATTERN_TAG};
use super::tracker::PatternStore;
use crate::config::CaptureConfig;
use crate::gateway::{MemoryGateway, RecalledMemory};
use crate::types::Shard;

const WARM_QUERY: &str = "auto-captured execution pattern tool succeeded";

/// Signature of a recalled memory if it was produced by auto-capture as an
/// execution pattern.
fn captured_signature(memory: &RecalledMemory) -> Option<String> {
    let context = memory.context_value();
    if context.get("source").and_then(|s| s.as_str()) != Some(CAPTURE_SOURCE) {
        return None;
    }
    let is_pattern = context
        .get("tags")
        .and_then(|t| t.as_array())
        .is_some_and(|tags| tags.iter().any(|t| t.as_str() == Some(PATTERN_TAG)));
    if !is_pattern {
        return None;
    }
    context
        .get("signature")
        .and_then(|s| s.as_str())
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Pre-seed the pattern store from the gateway.
///
/// Returns the number of signatures warmed. An unreachable gateway is
/// logged and leaves the store empty.
pub async fn warm_pattern_cache(
    gateway: &dyn MemoryGateway,
    patterns: &dyn PatternStore,
    config: &CaptureConfig,
) -> usize {
    let memories = match gateway
        .recall(WARM_QUERY, config.warm_recall_limit, Some(&[Shard::Procedural][..]))
        .await
    {
        Ok(memories) => memories,
        Err(e) => {
            warn!("Pattern cache warm-up skipped: {}", e);
            return 0;
        }
    };

    let signatures: HashSet<String> = memories.iter().filter_map(captured_signature).collect();
    for signature in &signatures {
        patterns.warm(signature, config.warm_boost);
    }

    info!(
        inspected = memories.len(),
        warmed = signatures.len(),
        "Pattern cache warmed"
    );
    signatures.len()
}
