//! Small text helpers shared by capture and extraction.

use std::collections::HashSet;

/// Marker appended to truncated strings.
pub const ELLIPSIS: &str = "...";

/// Truncate to at most `max_chars` characters, appending an ellipsis when cut.
///
/// Counts characters, not bytes, so multi-byte text never splits mid-codepoint.
pub fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        None => s.to_string(),
        Some((idx, _)) => format!("{}{}", &s[..idx], ELLIPSIS),
    }
}

/// Collapse all whitespace runs to single spaces.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Coarse exact-duplicate key: lower-cased, whitespace-collapsed, capped.
pub fn normalized_key(s: &str, cap: usize) -> String {
    collapse_whitespace(&s.to_lowercase()).chars().take(cap).collect()
}

/// Lower-cased alphanumeric tokens.
pub fn token_set(s: &str) -> HashSet<String> {
    s.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

/// Jaccard similarity of the token sets of two strings.
pub fn jaccard(a: &str, b: &str) -> f64 {
    let a = token_set(a);
    let b = token_set(b);
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(&b).count();
    let union = a.union(&b).count();
    intersection as f64 / union as f64
}
