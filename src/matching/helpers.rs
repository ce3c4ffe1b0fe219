//! Similarity scoring for the fuzzy pass.

use strsim::normalized_levenshtein;

/// Slack for ratios that land a rounding error below the threshold
/// (e.g. 3 edits over 20 chars).
const SCORE_EPSILON: f64 = 1e-9;

/// Normalized Levenshtein ratio in `0.0..=1.0`:
/// `1 - lev(a, b) / max(chars(a), chars(b))`. Two empty strings score `1.0`.
pub(crate) fn similarity(a: &str, b: &str) -> f64 {
    normalized_levenshtein(a, b)
}

/// Inclusive threshold test.
pub(crate) fn meets_threshold(score: f64, threshold: f64) -> bool {
    score + SCORE_EPSILON >= threshold
}
