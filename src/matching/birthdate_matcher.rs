use chrono::NaiveDate;
use std::collections::HashMap;

use super::{CandidatePool, MatchPass, PassOutput, retain_unique_claims};
use crate::models::{FighterRecord, MasterRecord, MatchResult, PassName};
use crate::table::KeyedRow;

/// Pass 4: date of birth.
///
/// Birth dates are not identifiers, so a date only links two records when it
/// belongs to exactly one still-unmatched fighter and exactly one pool row.
/// Rows whose date is missing or unparseable never match here.
#[derive(Debug, Clone, Copy, Default)]
pub struct BirthDatePass;

fn count_by_date<'a, T, F>(items: &'a [T], date_of: F) -> HashMap<NaiveDate, usize>
where
    F: Fn(&'a T) -> Option<NaiveDate>,
{
    let mut counts = HashMap::new();
    for item in items {
        if let Some(d) = date_of(item) {
            *counts.entry(d).or_insert(0) += 1;
        }
    }
    counts
}

impl MatchPass for BirthDatePass {
    fn name(&self) -> PassName {
        PassName::BirthDate
    }

    fn pool_excludes_claimed(&self) -> bool {
        true
    }

    fn apply(&self, unmatched: &[KeyedRow<'_, FighterRecord>], pool: &CandidatePool<'_>) -> PassOutput {
        let fighter_counts = count_by_date(unmatched, |f| f.row.birth_date);
        let mut by_date: HashMap<NaiveDate, Vec<&MasterRecord>> = HashMap::new();
        for &m in pool.rows() {
            if let Some(d) = m.birth_date {
                by_date.entry(d).or_default().push(m);
            }
        }

        let mut out = PassOutput::default();
        let mut results = Vec::new();
        for f in unmatched {
            let Some(date) = f.row.birth_date else {
                continue;
            };
            let Some(candidates) = by_date.get(&date) else {
                continue;
            };
            let sharing = fighter_counts.get(&date).copied().unwrap_or(0);
            match candidates.as_slice() {
                [m] if sharing == 1 => results.push(MatchResult::new(
                    PassName::BirthDate,
                    f.index,
                    f.row,
                    m,
                    CandidatePool::id_of(m),
                )),
                _ => out.ambiguous += 1,
            }
        }
        let (results, contested) = retain_unique_claims(results);
        out.results = results;
        out.ambiguous += contested;
        out
    }
}
