use std::collections::{HashMap, HashSet};

use crate::models::MasterRecord;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DedupStats {
    /// Distinct normalized keys shared by two or more master rows.
    pub ambiguous_keys: usize,
    pub dropped_ambiguous: usize,
    pub dropped_no_id: usize,
    pub dropped_claimed: usize,
}

/// Master rows eligible for the next pass.
#[derive(Debug, Clone, Default)]
pub struct CandidatePool<'a> {
    rows: Vec<&'a MasterRecord>,
    pub stats: DedupStats,
}

impl<'a> CandidatePool<'a> {
    pub fn rows(&self) -> &[&'a MasterRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Pool rows indexed by normalized key.
    pub fn by_key(&self) -> HashMap<&'a str, Vec<&'a MasterRecord>> {
        let mut map: HashMap<&'a str, Vec<&'a MasterRecord>> = HashMap::new();
        for &m in &self.rows {
            map.entry(m.normalized_key.as_str()).or_default().push(m);
        }
        map
    }

    /// Id of a pool row; every row in a pool has one.
    pub fn id_of(m: &MasterRecord) -> &str {
        m.external_id.as_deref().unwrap_or_default()
    }
}

/// Build the candidate pool for one pass.
///
/// A key that occurs more than once anywhere in the master table is ambiguous:
/// every row carrying it is dropped, never one picked. Rows without an
/// extractable id and rows whose id is already claimed are dropped as well.
pub fn dedupe<'a>(rows: &'a [MasterRecord], claimed: &HashSet<String>) -> CandidatePool<'a> {
    let mut key_counts: HashMap<&str, usize> = HashMap::new();
    for m in rows {
        *key_counts.entry(m.normalized_key.as_str()).or_insert(0) += 1;
    }

    let mut stats = DedupStats {
        ambiguous_keys: key_counts.values().filter(|&&n| n > 1).count(),
        ..Default::default()
    };
    let mut kept = Vec::with_capacity(rows.len());
    for m in rows {
        if key_counts.get(m.normalized_key.as_str()).copied().unwrap_or(0) > 1 {
            stats.dropped_ambiguous += 1;
            continue;
        }
        match m.external_id.as_deref() {
            None => stats.dropped_no_id += 1,
            Some(id) if claimed.contains(id) => stats.dropped_claimed += 1,
            Some(_) => kept.push(m),
        }
    }
    CandidatePool { rows: kept, stats }
}
