//! Copy reconciled reach/stance into another fighter table by external id.
//!
//! Used when publishing: the app's fighter table carries the external id but
//! not the physical attributes. Values the source does not have become the
//! placeholder, and stance is capitalised ("orthodox" -> "Orthodox").

use log::info;
use std::collections::HashMap;

use crate::models::FighterRecord;
use crate::table::SourceTable;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PropagateStats {
    pub rows: usize,
    pub reach_merged: usize,
    pub stance_merged: usize,
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

pub fn propagate_attributes(
    source: &SourceTable<FighterRecord>,
    target: &mut SourceTable<FighterRecord>,
    placeholder: &str,
) -> PropagateStats {
    // first row per id wins
    let mut by_id: HashMap<&str, &FighterRecord> = HashMap::new();
    for r in source.iter() {
        if let Some(id) = r.external_id.as_deref() {
            by_id.entry(id).or_insert(r);
        }
    }

    let mut stats = PropagateStats {
        rows: target.len(),
        ..Default::default()
    };
    for i in 0..target.len() {
        let Some(row) = target.row_mut(i) else {
            continue;
        };
        let src = row.external_id.as_deref().and_then(|id| by_id.get(id)).copied();
        let reach = src.and_then(|s| s.reach.clone());
        let stance = src.and_then(|s| s.stance.as_deref().map(capitalize));
        stats.reach_merged += usize::from(reach.is_some());
        stats.stance_merged += usize::from(stance.is_some());
        row.reach = Some(reach.unwrap_or_else(|| placeholder.to_string()));
        row.stance = Some(stance.unwrap_or_else(|| placeholder.to_string()));
    }
    info!(
        "Propagated reach to {} and stance to {} of {} rows",
        stats.reach_merged, stats.stance_merged, stats.rows
    );
    stats
}
