//! Identity matching between the primary fighter table and the master table.
//!
//! Each pass is a pure function of the still-unmatched fighters and a freshly
//! deduplicated [`CandidatePool`]. Passes never mutate their inputs; the
//! [`cascade::ReconciliationPipeline`] applies their results once per pass.

pub mod birthdate_matcher;
pub mod cascade;
pub mod dedup;
pub mod exact;
pub mod fuzzy;
pub mod helpers;
pub mod manual;
pub mod substring;

use std::collections::HashMap;

use crate::models::{FighterRecord, MatchResult, PassName};
use crate::table::KeyedRow;

pub use birthdate_matcher::BirthDatePass;
pub use cascade::{PassReport, ReconcileReport, ReconciliationPipeline};
pub use dedup::{CandidatePool, DedupStats, dedupe};
pub use exact::ExactKeyPass;
pub use fuzzy::FuzzyPass;
pub use manual::ManualOverrideMap;
pub use substring::SubstringPass;

/// What a pass decided for the rows it was given.
#[derive(Debug, Clone, Default)]
pub struct PassOutput {
    pub results: Vec<MatchResult>,
    /// Rows left unmatched because more than one candidate fit.
    pub ambiguous: usize,
    /// Rows left unmatched because the pairing is on the exclusion list.
    pub excluded: usize,
}

pub trait MatchPass: Sync {
    fn name(&self) -> PassName;

    /// Resolve `unmatched` against `pool`. At most one result per fighter and
    /// no external id twice.
    fn apply(&self, unmatched: &[KeyedRow<'_, FighterRecord>], pool: &CandidatePool<'_>) -> PassOutput;

    /// Whether the pool handed to this pass omits ids claimed so far. Name
    /// passes decide ambiguity against the full deduplicated table, so a
    /// later claim cannot turn an ambiguous name into a unique one.
    fn pool_excludes_claimed(&self) -> bool {
        false
    }
}

/// Drop every result whose external id was claimed by more than one fighter
/// in the same pass. Returns the survivors and the number of fighters dropped.
pub fn retain_unique_claims(results: Vec<MatchResult>) -> (Vec<MatchResult>, usize) {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for r in &results {
        *counts.entry(r.external_id.as_str()).or_insert(0) += 1;
    }
    let contested: std::collections::HashSet<String> = counts
        .into_iter()
        .filter(|(_, n)| *n > 1)
        .map(|(id, _)| id.to_string())
        .collect();
    if contested.is_empty() {
        return (results, 0);
    }
    let before = results.len();
    let kept: Vec<MatchResult> = results
        .into_iter()
        .filter(|r| !contested.contains(&r.external_id))
        .collect();
    let dropped = before - kept.len();
    log::debug!(
        "{} fighters competed for {} external ids; all left unmatched",
        dropped,
        contested.len()
    );
    (kept, dropped)
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PassName;

    fn result(idx: usize, id: &str) -> MatchResult {
        MatchResult {
            primary_index: idx,
            external_id: id.into(),
            reach: None,
            stance: None,
            pass: PassName::Substring,
            original_name: format!("f{idx}"),
            matched_name: id.into(),
            score: None,
        }
    }

    #[test]
    fn contested_ids_drop_every_claimant() {
        let (kept, dropped) =
            retain_unique_claims(vec![result(0, "a"), result(1, "b"), result(2, "a")]);
        assert_eq!(dropped, 2);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].external_id, "b");
    }

    #[test]
    fn uncontested_results_pass_through() {
        let (kept, dropped) = retain_unique_claims(vec![result(0, "a"), result(1, "b")]);
        assert_eq!(dropped, 0);
        assert_eq!(kept.len(), 2);
    }
}
