use rayon::prelude::*;

use super::{CandidatePool, MatchPass, PassOutput, retain_unique_claims};
use crate::models::{FighterRecord, MasterRecord, MatchResult, PassName};
use crate::table::KeyedRow;

/// Pass 2: the fighter's key occurs inside exactly one master key
/// ("jose aldo" inside "jose aldo junior").
#[derive(Debug, Clone, Copy, Default)]
pub struct SubstringPass;

enum Outcome<'a> {
    Unique(&'a MasterRecord),
    Ambiguous,
    NoCandidate,
}

fn find_unique<'a>(key: &str, pool: &[&'a MasterRecord]) -> Outcome<'a> {
    let mut found: Option<&'a MasterRecord> = None;
    for &m in pool {
        if m.normalized_key.contains(key) {
            if found.is_some() {
                return Outcome::Ambiguous;
            }
            found = Some(m);
        }
    }
    match found {
        Some(m) => Outcome::Unique(m),
        None => Outcome::NoCandidate,
    }
}

impl MatchPass for SubstringPass {
    fn name(&self) -> PassName {
        PassName::Substring
    }

    fn apply(&self, unmatched: &[KeyedRow<'_, FighterRecord>], pool: &CandidatePool<'_>) -> PassOutput {
        let outcomes: Vec<(usize, Outcome<'_>)> = unmatched
            .par_iter()
            .enumerate()
            .filter(|(_, f)| !f.key.is_empty())
            .map(|(i, f)| (i, find_unique(&f.key, pool.rows())))
            .collect();

        let mut out = PassOutput::default();
        let mut results = Vec::new();
        for (i, outcome) in outcomes {
            let f = &unmatched[i];
            match outcome {
                Outcome::Unique(m) => results.push(MatchResult::new(
                    PassName::Substring,
                    f.index,
                    f.row,
                    m,
                    CandidatePool::id_of(m),
                )),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::dedupe;
    use crate::matching::test_support::{fighter, master};
    use crate::table::SourceTable;
    use std::collections::HashSet;

    #[test]
    fn unique_containment_matches() {
        let primary = SourceTable::new("primary", vec![], vec![fighter("Jose Aldo")]);
        let masters = vec![master("Jose Aldo Junior", "ja1"), master("Renato Moicano", "rm1")];
        let pool = dedupe(&masters, &HashSet::new());
        let out = SubstringPass.apply(&primary.unmatched(), &pool);
        assert_eq!(out.results.len(), 1);
        assert_eq!(out.results[0].external_id, "ja1");
        assert_eq!(out.results[0].matched_name, "Jose Aldo Junior");
    }

    #[test]
    fn multiple_containing_keys_are_ambiguous() {
        let primary = SourceTable::new("primary", vec![], vec![fighter("Silva")]);
        let masters = vec![master("Anderson Silva", "a1"), master("Wanderlei Silva", "w1")];
        let pool = dedupe(&masters, &HashSet::new());
        let out = SubstringPass.apply(&primary.unmatched(), &pool);
        assert!(out.results.is_empty());
        assert_eq!(out.ambiguous, 1);
    }

    #[test]
    fn ambiguous_master_key_not_reachable_by_substring() {
        let primary = SourceTable::new("primary", vec![], vec![fighter("Tony Johnson")]);
        let masters = vec![
            master("Tony Johnson Jr", "t1"),
            master("Tony Johnson Jr.", "t2"),
        ];
        let pool = dedupe(&masters, &HashSet::new());
        let out = SubstringPass.apply(&primary.unmatched(), &pool);
        assert!(out.results.is_empty());
    }

    #[test]
    fn empty_key_never_matches() {
        let primary = SourceTable::new("primary", vec![], vec![fighter("?!")]);
        let masters = vec![master("Only One", "o1")];
        let pool = dedupe(&masters, &HashSet::new());
        let out = SubstringPass.apply(&primary.unmatched(), &pool);
        assert!(out.results.is_empty());
    }
}
