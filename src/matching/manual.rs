use log::warn;
use std::collections::{HashMap, HashSet};

use super::{PassOutput, retain_unique_claims};
use crate::config::ManualOverride;
use crate::models::{FighterRecord, MasterRecord, MatchResult, PassName};
use crate::table::KeyedRow;

/// Hand-verified `scraped name -> master name` pairs, applied after every
/// automatic pass by exact display-name lookup on both sides.
#[derive(Debug, Clone, Default)]
pub struct ManualOverrideMap {
    pairs: HashMap<String, String>,
}

impl ManualOverrideMap {
    pub fn new(overrides: &[ManualOverride]) -> Self {
        let pairs = overrides
            .iter()
            .map(|o| (o.scraped_name.trim().to_string(), o.master_name.trim().to_string()))
            .collect();
        Self { pairs }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn target_of(&self, scraped_name: &str) -> Option<&str> {
        self.pairs.get(scraped_name.trim()).map(String::as_str)
    }

    /// Resolve overrides for `unmatched` against the whole master table.
    /// An override never hands out an id that is already claimed.
    pub fn apply(
        &self,
        unmatched: &[KeyedRow<'_, FighterRecord>],
        secondary: &[MasterRecord],
        claimed: &HashSet<String>,
    ) -> PassOutput {
        let mut out = PassOutput::default();
        if self.pairs.is_empty() {
            return out;
        }
        let mut by_name: HashMap<&str, &MasterRecord> = HashMap::new();
        for m in secondary {
            if m.external_id.is_some() {
                by_name.entry(m.display_name.as_str()).or_insert(m);
            }
        }

        let mut results = Vec::new();
        for f in unmatched {
            let Some(target) = self.target_of(&f.row.display_name) else {
                continue;
            };
            let Some(m) = by_name.get(target) else {
                warn!(
                    "Manual override {:?} -> {:?}: no master row with that name",
                    f.row.display_name, target
                );
                continue;
            };
            let Some(id) = m.external_id.as_deref() else {
                continue;
            };
            if claimed.contains(id) {
                warn!(
                    "Manual override {:?} -> {:?}: id {} already assigned, skipped",
                    f.row.display_name, target, id
                );
                out.excluded += 1;
                continue;
            }
            results.push(MatchResult::new(PassName::ManualOverride, f.index, f.row, m, id));
        }
        let (results, contested) = retain_unique_claims(results);
        out.results = results;
        out.ambiguous += contested;
        out
    }
}
