use super::{CandidatePool, MatchPass, PassOutput, retain_unique_claims};
use crate::models::{FighterRecord, MatchResult, PassName};
use crate::table::KeyedRow;

/// Pass 1: normalized-name equality.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactKeyPass;

impl MatchPass for ExactKeyPass {
    fn name(&self) -> PassName {
        PassName::ExactKey
    }

    fn apply(&self, unmatched: &[KeyedRow<'_, FighterRecord>], pool: &CandidatePool<'_>) -> PassOutput {
        let index = pool.by_key();
        let mut out = PassOutput::default();
        let mut results = Vec::new();
        for f in unmatched {
            if f.key.is_empty() {
                continue;
            }
            match index.get(f.key.as_str()).map(Vec::as_slice) {
                Some([m]) => results.push(MatchResult::new(
                    PassName::ExactKey,
                    f.index,
                    f.row,
                    m,
                    CandidatePool::id_of(m),
                )),
                // a deduplicated pool cannot hold two rows per key; skip rather than guess
                Some(_) => out.ambiguous += 1,
                None => {}
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
    fn matches_on_normalized_name() {
        let primary = SourceTable::new(
            "primary",
            vec![],
            vec![fighter("B.J. Penn"), fighter("Jon Jones"), fighter("Unknown Guy")],
        );
        let masters = vec![master("BJ Penn", "bj1"), master("jon jones", "jj1")];
        let pool = dedupe(&masters, &HashSet::new());
        let out = ExactKeyPass.apply(&primary.unmatched(), &pool);
        assert_eq!(out.results.len(), 2);
        assert_eq!(out.results[0].primary_index, 0);
        assert_eq!(out.results[0].external_id, "bj1");
        assert_eq!(out.results[0].reach.as_deref(), Some("70\""));
        assert_eq!(out.results[1].external_id, "jj1");
    }

    #[test]
    fn duplicate_master_key_never_matches() {
        let primary = SourceTable::new("primary", vec![], vec![fighter("Michael McDonald")]);
        let masters = vec![
            master("Michael McDonald", "m1"),
            master("Michael Mcdonald", "m2"),
        ];
        let pool = dedupe(&masters, &HashSet::new());
        let out = ExactKeyPass.apply(&primary.unmatched(), &pool);
        assert!(out.results.is_empty());
    }

    #[test]
    fn inner_whitespace_is_part_of_the_key() {
        let primary = SourceTable::new(
            "primary",
            vec![],
            vec![fighter("Bruno Silva"), fighter("Bruno  Silva.")],
        );
        let masters = vec![master("Bruno Silva", "b1")];
        let pool = dedupe(&masters, &HashSet::new());
        // "bruno  silva" keeps its double space
        let out = ExactKeyPass.apply(&primary.unmatched(), &pool);
        assert_eq!(out.results.len(), 1);
        assert_eq!(out.results[0].primary_index, 0);
    }

    #[test]
    fn two_fighters_with_one_key_both_skipped() {
        let primary = SourceTable::new(
            "primary",
            vec![],
            vec![fighter("Bruno Silva"), fighter("Bruno Silva!")],
        );
        let masters = vec![master("Bruno Silva", "b1")];
        let pool = dedupe(&masters, &HashSet::new());
        let out = ExactKeyPass.apply(&primary.unmatched(), &pool);
        assert!(out.results.is_empty());
        assert_eq!(out.ambiguous, 2);
    }
}
