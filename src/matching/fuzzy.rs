//! Pass 3: fuzzy name similarity.
//!
//! A fighter is matched only when exactly one pool key scores at or above the
//! threshold. Pairings listed in the exclusion table were found wrong on
//! manual audit and are rejected even when they clear the threshold.

use log::info;
use rayon::prelude::*;
use std::collections::HashMap;

use super::helpers::{meets_threshold, similarity};
use super::{CandidatePool, MatchPass, PassOutput, retain_unique_claims};
use crate::config::{DEFAULT_FUZZY_THRESHOLD, FuzzyExclusion};
use crate::models::{FighterRecord, MasterRecord, MatchResult, PassName};
use crate::normalize::normalize_name;
use crate::table::KeyedRow;

#[derive(Debug, Clone)]
pub struct FuzzyPass {
    threshold: f64,
    /// normalized key -> forbidden external id
    exclusions: HashMap<String, String>,
}

impl Default for FuzzyPass {
    fn default() -> Self {
        Self::new(DEFAULT_FUZZY_THRESHOLD, &[])
    }
}

enum Outcome<'a> {
    Unique(&'a MasterRecord, f64),
    Ambiguous,
    NoCandidate,
}

impl FuzzyPass {
    pub fn new(threshold: f64, exclusions: &[FuzzyExclusion]) -> Self {
        let exclusions = exclusions
            .iter()
            .map(|e| (normalize_name(&e.normalized_key), e.external_id.trim().to_string()))
            .collect();
        Self {
            threshold,
            exclusions,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn is_excluded(&self, key: &str, external_id: &str) -> bool {
        self.exclusions.get(key).is_some_and(|id| id == external_id)
    }

    fn closest<'a>(&self, key: &str, pool: &[&'a MasterRecord]) -> Outcome<'a> {
        let mut best: Option<(&'a MasterRecord, f64)> = None;
        for &m in pool {
            let score = similarity(key, &m.normalized_key);
            if !meets_threshold(score, self.threshold) {
                continue;
            }
            if best.is_some() {
                return Outcome::Ambiguous;
            }
            best = Some((m, score));
        }
        match best {
            Some((m, score)) => Outcome::Unique(m, score),
            None => Outcome::NoCandidate,
        }
    }
}

impl MatchPass for FuzzyPass {
    fn name(&self) -> PassName {
        PassName::Fuzzy
    }

    fn apply(&self, unmatched: &[KeyedRow<'_, FighterRecord>], pool: &CandidatePool<'_>) -> PassOutput {
        let outcomes: Vec<(usize, Outcome<'_>)> = unmatched
            .par_iter()
            .enumerate()
            .filter(|(_, f)| !f.key.is_empty())
            .map(|(i, f)| (i, self.closest(&f.key, pool.rows())))
            .collect();

        let mut out = PassOutput::default();
        let mut results = Vec::new();
        for (i, outcome) in outcomes {
            let f = &unmatched[i];
            match outcome {
                Outcome::Unique(m, score) => {
                    let id = CandidatePool::id_of(m);
                    if self.is_excluded(&f.key, id) {
                        info!(
                            "Fuzzy match {:?} -> {:?} ({}) rejected by exclusion table",
                            f.row.display_name, m.display_name, id
                        );
                        out.excluded += 1;
                        continue;
                    }
                    results.push(
                        MatchResult::new(PassName::Fuzzy, f.index, f.row, m, id).with_score(score),
                    );
                }
                Outcome::Ambiguous => out.ambiguous += 1,
                Outcome::NoCandidate => {}
            }
        }
        let (results, contested) = retain_unique_claims(results);
        out.results = results;
        out.ambiguous += contested;
        out
    }
}
