//! Three-way outcome classification for tool calls.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, LazyLock};

use super::signature::SignatureRegistry;
use super::tracker::PatternStore;
use crate::types::ToolCallRecord;

/// Result text that indicates the call failed even without an explicit error.
static FAILURE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)command not found",
        r"(?i)no such process",
        r"(?i)permission denied",
        r"(?i)connection refused",
        r"(?i)no such file or directory",
        r"(?i)\btimed out\b|\btimeout\b",
        r"(?i)\b(?:http/\d(?:\.\d)?|status(?: code)?:?)\s*[45]\d{2}\b",
        r"(?i)\b[45]\d{2} (?:bad request|unauthorized|forbidden|not found|internal server error|bad gateway|service unavailable)\b",
        r"(?im)^\s*(?:error|fatal)\b",
        r"(?i)\bnot found\b",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

/// True if any line of the text looks like a failure.
pub fn is_failure_text(text: &str) -> bool {
    FAILURE_PATTERNS.iter().any(|re| re.is_match(text))
}

/// The first line of the text that looks like a failure.
pub fn first_failure_line(text: &str) -> Option<&str> {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && is_failure_text(line))
}

/// Classification outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// The call failed: worth remembering what went wrong.
    Failure,
    /// First or second success of this kind.
    Novel,
    /// A pattern seen at least twice before.
    Repeated,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Failure => "failure",
            Outcome::Novel => "novel",
            Outcome::Repeated => "repeated",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome plus the data that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub outcome: Outcome,
    pub signature: String,
    /// Occurrence count before this call was counted.
    pub prior_count: u32,
}

/// Classifies tool calls and counts every classification.
#[derive(Clone)]
pub struct OutcomeClassifier {
    signatures: Arc<SignatureRegistry>,
    patterns: Arc<dyn PatternStore>,
}

impl OutcomeClassifier {
    /// Successes with a prior count at or below this are novel.
    const NOVEL_MAX_PRIOR: u32 = 1;

    pub fn new(patterns: Arc<dyn PatternStore>) -> Self {
        Self::with_registry(Arc::new(SignatureRegistry::builtin()), patterns)
    }

    pub fn with_registry(signatures: Arc<SignatureRegistry>, patterns: Arc<dyn PatternStore>) -> Self {
        Self {
            signatures,
            patterns,
        }
    }

    pub fn patterns(&self) -> &Arc<dyn PatternStore> {
        &self.patterns
    }

    pub fn signature(&self, record: &ToolCallRecord) -> String {
        self.signatures.signature(&record.tool, &record.args)
    }

    /// Classify a call. Increments the signature's count whatever the outcome.
    pub fn classify(&self, record: &ToolCallRecord) -> Classification {
        let signature = self.signature(record);
        let prior_count = self.patterns.increment(&signature);

        let outcome = if record.has_error() || is_failure_text(record.result_text()) {
            Outcome::Failure
        } else if prior_count <= Self::NOVEL_MAX_PRIOR {
            Outcome::Novel
        } else {
            Outcome::Repeated
        };

        Classification {
            outcome,
            signature,
            prior_count,
        }
    }
}
