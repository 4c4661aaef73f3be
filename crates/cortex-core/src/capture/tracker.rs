//! Pattern occurrence tracking.
//!
//! Counts how many times each signature has been classified. Counts only
//! grow; they reset when the process restarts unless warmed from the
//! gateway.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Storage for signature occurrence counts.
///
/// Implementations must make [`PatternStore::increment`] atomic with respect
/// to concurrent callers.
pub trait PatternStore: Send + Sync {
    /// Current count for a signature (0 if unseen).
    fn count(&self, signature: &str) -> u32;

    /// Increment a signature's count, returning the count before the increment.
    fn increment(&self, signature: &str) -> u32;

    /// Add `by` to a signature's count without classifying.
    fn warm(&self, signature: &str, by: u32);

    /// All tracked signatures with their counts, highest first.
    fn snapshot(&self) -> Vec<(String, u32)>;

    /// Number of tracked signatures.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-process pattern store guarded by a mutex.
#[derive(Debug, Default)]
pub struct InMemoryPatternStore {
    counts: Mutex<HashMap<String, u32>>,
}

impl InMemoryPatternStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, u32>> {
        // A panic while holding the lock cannot leave a count half-written.
        self.counts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PatternStore for InMemoryPatternStore {
    fn count(&self, signature: &str) -> u32 {
        self.lock().get(signature).copied().unwrap_or(0)
    }

    fn increment(&self, signature: &str) -> u32 {
        let mut counts = self.lock();
        let entry = counts.entry(signature.to_string()).or_insert(0);
        let prior = *entry;
        *entry = entry.saturating_add(1);
        prior
    }

    fn warm(&self, signature: &str, by: u32) {
        let mut counts = self.lock();
        let entry = counts.entry(signature.to_string()).or_insert(0);
        *entry = entry.saturating_add(by);
    }

    fn snapshot(&self) -> Vec<(String, u32)> {
        let mut entries: Vec<(String, u32)> = self
            .lock()
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        entries
    }

    fn len(&self) -> usize {
        self.lock().len()
    }
}
