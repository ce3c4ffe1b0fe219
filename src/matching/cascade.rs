//! Reconciliation pipeline
//!
//! Runs the matching passes in a fixed order, each on the fighters still
//! unmatched after the previous one:
//!
//! 1. exact normalized name
//! 2. unique substring
//! 3. fuzzy similarity (with exclusion table)
//! 4. unique date of birth
//!
//! followed by the manual override map. The name passes see the deduplicated
//! master table regardless of claims, so whether a name is ambiguous does not
//! depend on what earlier passes or runs assigned; the date pass sees only
//! unclaimed rows. Results naming an id that is already claimed are dropped,
//! so no id is ever assigned twice. Results are applied to the primary table
//! only after a pass has finished.

use log::{debug, info, warn};
use std::collections::HashSet;
use std::path::Path;
use std::time::Instant;

use super::{
    BirthDatePass, DedupStats, ExactKeyPass, FuzzyPass, ManualOverrideMap, MatchPass, PassOutput,
    SubstringPass, dedupe,
};
use crate::config::ReconcileConfig;
use crate::models::{FighterRecord, MasterRecord, MatchResult, PassName};
use crate::table::SourceTable;

/// Outcome of one pass.
#[derive(Debug, Clone)]
pub struct PassReport {
    pub pass: PassName,
    pub new_matches: usize,
    pub remaining_unmatched: usize,
    pub ambiguous: usize,
    pub excluded: usize,
    pub pool_size: usize,
    pub dedup: DedupStats,
    pub results: Vec<MatchResult>,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResidualFighter {
    pub index: usize,
    pub name: String,
    pub birth_date: String,
}

#[derive(Debug, Clone, Default)]
pub struct ReconcileReport {
    pub total_rows: usize,
    pub matched_before: usize,
    pub passes: Vec<PassReport>,
    pub residual: Vec<ResidualFighter>,
    pub duration_ms: u64,
}

impl ReconcileReport {
    pub fn match_counts(&self) -> Vec<(PassName, usize)> {
        self.passes.iter().map(|p| (p.pass, p.new_matches)).collect()
    }

    pub fn total_new_matches(&self) -> usize {
        self.passes.iter().map(|p| p.new_matches).sum()
    }

    pub fn pass(&self, pass: PassName) -> Option<&PassReport> {
        self.passes.iter().find(|p| p.pass == pass)
    }

    /// Every result of every pass, in pass order.
    pub fn all_results(&self) -> impl Iterator<Item = &MatchResult> {
        self.passes.iter().flat_map(|p| p.results.iter())
    }

    pub fn write_summary(&self, path: &Path) -> std::io::Result<()> {
        use std::io::Write;
        let mut f = std::io::BufWriter::new(std::fs::File::create(path)?);

        writeln!(f, "Fighter Reconciliation Summary")?;
        writeln!(f, "==============================")?;
        writeln!(
            f,
            "Rows: {}  Already matched: {}\n",
            self.total_rows, self.matched_before
        )?;
        writeln!(
            f,
            "{:<42} {:>8} {:>10} {:>10} {:>9} {:>8}",
            "Pass", "Matches", "Unmatched", "Ambiguous", "Excluded", "Pool"
        )?;
        writeln!(f, "{}", "-".repeat(92))?;
        for p in &self.passes {
            writeln!(
                f,
                "{:<42} {:>8} {:>10} {:>10} {:>9} {:>8}",
                p.pass.description(),
                p.new_matches,
                p.remaining_unmatched,
                p.ambiguous,
                p.excluded,
                p.pool_size
            )?;
        }
        writeln!(f, "{}", "-".repeat(92))?;
        writeln!(f, "New matches: {}", self.total_new_matches())?;
        writeln!(f, "Duration: {:.2}s\n", self.duration_ms as f64 / 1000.0)?;

        if let Some(fuzzy) = self.pass(PassName::Fuzzy) {
            if !fuzzy.results.is_empty() {
                writeln!(f, "Fuzzy matches (audit)")?;
                writeln!(f, "{:<32} {:<32} {:<18} {:>6}", "Original", "Matched", "Id", "Score")?;
                for r in &fuzzy.results {
                    writeln!(
                        f,
                        "{:<32} {:<32} {:<18} {:>6.3}",
                        r.original_name,
                        r.matched_name,
                        r.external_id,
                        r.score.unwrap_or_default()
                    )?;
                }
                writeln!(f)?;
            }
        }

        writeln!(f, "Unmatched fighters: {}", self.residual.len())?;
        for r in &self.residual {
            writeln!(f, "  {:<40} {}", r.name, r.birth_date)?;
        }
        f.flush()
    }
}

pub struct ReconciliationPipeline {
    passes: Vec<Box<dyn MatchPass>>,
    overrides: ManualOverrideMap,
}

impl ReconciliationPipeline {
    pub fn new(passes: Vec<Box<dyn MatchPass>>, overrides: ManualOverrideMap) -> Self {
        Self { passes, overrides }
    }

    /// The standard pass order: exact, substring, fuzzy, birth date.
    pub fn from_config(cfg: &ReconcileConfig) -> Self {
        Self::new(
            vec![
                Box::new(ExactKeyPass),
                Box::new(SubstringPass),
                Box::new(FuzzyPass::new(cfg.fuzzy_threshold, &cfg.fuzzy_exclusions)),
                Box::new(BirthDatePass),
            ],
            ManualOverrideMap::new(&cfg.manual_overrides),
        )
    }

    pub fn pass_names(&self) -> Vec<PassName> {
        self.passes.iter().map(|p| p.name()).collect()
    }

    pub fn run(
        &self,
        primary: &mut SourceTable<FighterRecord>,
        secondary: &SourceTable<MasterRecord>,
    ) -> ReconcileReport {
        let start = Instant::now();
        let mut claimed = claimed_ids(primary);
        let mut report = ReconcileReport {
            total_rows: primary.len(),
            matched_before: primary.iter().filter(|r| r.is_matched()).count(),
            ..Default::default()
        };
        info!(
            "Reconciling {} fighters ({} already matched) against {} master rows",
            report.total_rows,
            report.matched_before,
            secondary.len()
        );

        let unclaimed = HashSet::new();
        for (n, pass) in self.passes.iter().enumerate() {
            let pass_start = Instant::now();
            let pool = if pass.pool_excludes_claimed() {
                dedupe(secondary.rows(), &claimed)
            } else {
                dedupe(secondary.rows(), &unclaimed)
            };
            let (output, pool_size, dedup) = {
                let unmatched = primary.unmatched();
                (pass.apply(&unmatched, &pool), pool.len(), pool.stats)
            };
            let pass_report = commit(
                primary,
                &mut claimed,
                pass.name(),
                output,
                pool_size,
                dedup,
                pass_start,
            );
            info!(
                "Pass {} ({}): {} new matches, {} still unmatched (pool {}, ambiguous {}, excluded {})",
                n + 1,
                pass_report.pass,
                pass_report.new_matches,
                pass_report.remaining_unmatched,
                pass_report.pool_size,
                pass_report.ambiguous,
                pass_report.excluded
            );
            if pass_report.pass == PassName::Fuzzy {
                log_audit_table(&pass_report.results);
            }
            report.passes.push(pass_report);
        }

        let pass_start = Instant::now();
        let output = {
            let unmatched = primary.unmatched();
            self.overrides.apply(&unmatched, secondary.rows(), &claimed)
        };
        let pass_report = commit(
            primary,
            &mut claimed,
            PassName::ManualOverride,
            output,
            secondary.len(),
            DedupStats::default(),
            pass_start,
        );
        info!(
            "Manual overrides: {} applied, {} still unmatched",
            pass_report.new_matches, pass_report.remaining_unmatched
        );
        report.passes.push(pass_report);

        report.residual = primary
            .unmatched()
            .into_iter()
            .map(|k| ResidualFighter {
                index: k.index,
                name: k.row.display_name.clone(),
                birth_date: k.row.birth_date_raw.clone(),
            })
            .collect();
        report.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            "Reconciliation finished: {} new matches, {} fighters unmatched",
            report.total_new_matches(),
            report.residual.len()
        );
        report
    }
}

/// External ids already present in the primary table.
pub fn claimed_ids(primary: &SourceTable<FighterRecord>) -> HashSet<String> {
    primary.iter().filter_map(|r| r.external_id.clone()).collect()
}

/// Write a pass's results into the table. Returns how many rows changed.
pub fn apply_results(primary: &mut SourceTable<FighterRecord>, results: &[MatchResult]) -> usize {
    let mut applied = 0;
    for r in results {
        let Some(row) = primary.row_mut(r.primary_index) else {
            warn!("Result for missing row {} ignored", r.primary_index);
            continue;
        };
        if row.is_matched() {
            continue;
        }
        row.external_id = Some(r.external_id.clone());
        if r.reach.is_some() {
            row.reach = r.reach.clone();
        }
        if r.stance.is_some() {
            row.stance = r.stance.clone();
        }
        applied += 1;
    }
    applied
}

fn commit(
    primary: &mut SourceTable<FighterRecord>,
    claimed: &mut HashSet<String>,
    pass: PassName,
    output: PassOutput,
    pool_size: usize,
    dedup: DedupStats,
    started: Instant,
) -> PassReport {
    // never hand out an id claimed by an earlier pass
    let (results, taken): (Vec<MatchResult>, Vec<MatchResult>) = output
        .results
        .into_iter()
        .partition(|r| !claimed.contains(&r.external_id));
    for r in &taken {
        debug!(
            "{}: {:?} -> {:?} skipped, id {} already assigned",
            pass, r.original_name, r.matched_name, r.external_id
        );
    }
    let new_matches = apply_results(primary, &results);
    claimed.extend(results.iter().map(|r| r.external_id.clone()));
    PassReport {
        pass,
        new_matches,
        remaining_unmatched: primary.iter().filter(|r| !r.is_matched()).count(),
        ambiguous: output.ambiguous,
        excluded: output.excluded + taken.len(),
        pool_size,
        dedup,
        results,
        duration_ms: started.elapsed().as_millis() as u64,
    }
}

fn log_audit_table(results: &[MatchResult]) {
    if results.is_empty() {
        return;
    }
    info!("Fuzzy match audit ({} rows):", results.len());
    info!("{:<32} {:<32} {}", "Original", "Matched", "Id");
    for r in results {
        info!("{:<32} {:<32} {}", r.original_name, r.matched_name, r.external_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ManualOverride;
    use crate::matching::test_support::{fighter, fighter_born, master, master_born};
    use std::collections::HashMap;

    fn primary(rows: Vec<FighterRecord>) -> SourceTable<FighterRecord> {
        SourceTable::new("primary", vec![], rows)
    }

    fn secondary(rows: Vec<MasterRecord>) -> SourceTable<MasterRecord> {
        SourceTable::new("secondary", vec![], rows)
    }

    fn pipeline() -> ReconciliationPipeline {
        ReconciliationPipeline::from_config(&ReconcileConfig::default())
    }

    fn count(report: &ReconcileReport, pass: PassName) -> usize {
        report.pass(pass).map(|p| p.new_matches).unwrap_or(0)
    }

    fn sample() -> (SourceTable<FighterRecord>, SourceTable<MasterRecord>) {
        let p = primary(vec![
            fighter("Jon Jones"),
            fighter("Jose Aldo"),
            fighter("Khabib Nurmagomedow"),
            fighter_born("Kangjie Zhu", (1998, 6, 20)),
            fighter("Steve Erceg"),
            fighter("Nobody Known"),
        ]);
        let s = secondary(vec![
            master("Jon Jones", "jj"),
            master("Jose Aldo Junior", "ja"),
            master("Khabib Nurmagomedov", "kn"),
            master_born("Zhu Kangjie", "zk", (1998, 6, 20)),
            master("Stephen Erceg", "se"),
            master("Michael McDonald", "m1"),
            master("Michael Mcdonald", "m2"),
        ]);
        (p, s)
    }

    #[test]
    fn passes_run_in_fixed_order() {
        assert_eq!(
            pipeline().pass_names(),
            vec![
                PassName::ExactKey,
                PassName::Substring,
                PassName::Fuzzy,
                PassName::BirthDate
            ]
        );
    }

    #[test]
    fn each_pass_contributes_in_order() {
        let (mut p, s) = sample();
        let report = pipeline().run(&mut p, &s);
        assert_eq!(count(&report, PassName::ExactKey), 1);
        assert_eq!(count(&report, PassName::Substring), 1);
        assert_eq!(count(&report, PassName::Fuzzy), 1);
        assert_eq!(count(&report, PassName::BirthDate), 1);
        assert_eq!(count(&report, PassName::ManualOverride), 1);
        assert_eq!(report.residual.len(), 1);
        assert_eq!(report.residual[0].name, "Nobody Known");
        let ids: Vec<Option<&str>> = p.iter().map(|r| r.external_id.as_deref()).collect();
        assert_eq!(
            ids,
            vec![Some("jj"), Some("ja"), Some("kn"), Some("zk"), Some("se"), None]
        );
        assert_eq!(p.rows()[0].reach.as_deref(), Some("70\""));
        assert_eq!(p.rows()[0].stance.as_deref(), Some("Orthodox"));
    }

    #[test]
    fn second_run_changes_nothing() {
        let (mut p, s) = sample();
        pipeline().run(&mut p, &s);
        let after_first = p.rows().to_vec();
        let report = pipeline().run(&mut p, &s);
        assert_eq!(report.total_new_matches(), 0);
        assert!(report.match_counts().iter().all(|(_, n)| *n == 0));
        assert_eq!(p.rows(), after_first.as_slice());
    }

    #[test]
    fn late_claim_does_not_resolve_fuzzy_ambiguity_on_rerun() {
        let mut p = primary(vec![fighter("Stephen Ercek"), fighter("Steve Erceg")]);
        let s = secondary(vec![
            master("Stephen Erceg", "se"),
            master("Stephen Ercea", "sa"),
        ]);
        let first = pipeline().run(&mut p, &s);
        assert_eq!(count(&first, PassName::Fuzzy), 0);
        assert_eq!(count(&first, PassName::ManualOverride), 1);
        let ids: Vec<Option<&str>> = p.iter().map(|r| r.external_id.as_deref()).collect();
        assert_eq!(ids, vec![None, Some("se")]);

        let second = pipeline().run(&mut p, &s);
        assert_eq!(second.total_new_matches(), 0);
        assert_eq!(second.pass(PassName::Fuzzy).map(|r| r.ambiguous), Some(1));
        assert_eq!(p.rows()[0].external_id, None);
    }

    #[test]
    fn name_match_on_claimed_id_is_dropped_and_counted() {
        let mut taken = fighter("Jon Jones");
        taken.external_id = Some("jj".into());
        let mut p = primary(vec![taken, fighter("Jon Jones")]);
        let s = secondary(vec![master("Jon Jones", "jj")]);
        let report = pipeline().run(&mut p, &s);
        let exact = report.pass(PassName::ExactKey).map(|r| (r.new_matches, r.excluded));
        assert_eq!(exact, Some((0, 1)));
        assert_eq!(p.rows()[1].external_id, None);
    }

    #[test]
    fn no_external_id_assigned_twice() {
        let p = vec![
            fighter("Jon Jones"),
            fighter("Jon Jonez"),
            fighter("Jon"),
            fighter("Alex Pereira"),
            fighter("Alex Pereyra"),
            fighter_born("A", (1990, 5, 5)),
            fighter("Steve Erceg"),
            fighter("Stephen Erceg"),
        ];
        let s = secondary(vec![
            master("Jon Jones", "jj"),
            master("Alex Pereira", "ap"),
            master_born("Zed", "zz", (1990, 5, 5)),
            master("Stephen Erceg", "se"),
        ]);
        let mut p = primary(p);
        pipeline().run(&mut p, &s);
        let mut seen: HashMap<&str, usize> = HashMap::new();
        for r in p.iter() {
            if let Some(id) = r.external_id.as_deref() {
                *seen.entry(id).or_insert(0) += 1;
            }
        }
        assert!(seen.values().all(|&n| n == 1), "{seen:?}");
        // "Stephen Erceg" takes "se" by exact key, so the override for "Steve Erceg" is refused
        assert_eq!(p.rows()[7].external_id.as_deref(), Some("se"));
        assert_eq!(p.rows()[6].external_id, None);
    }

    #[test]
    fn ids_already_in_table_are_claimed() {
        let mut existing = fighter("Jon Jones");
        existing.external_id = Some("jj".into());
        let mut p = primary(vec![existing, fighter("Jon Jonez")]);
        let s = secondary(vec![master("Jon Jones", "jj")]);
        let report = pipeline().run(&mut p, &s);
        assert_eq!(report.matched_before, 1);
        assert_eq!(report.total_new_matches(), 0);
        assert_eq!(p.rows()[1].external_id, None);
    }

    #[test]
    fn duplicate_master_keys_block_exact_and_substring() {
        let mut p = primary(vec![fighter("Michael McDonald"), fighter("McDonald")]);
        let s = secondary(vec![
            master("Michael McDonald", "m1"),
            master("Michael Mcdonald", "m2"),
        ]);
        let report = pipeline().run(&mut p, &s);
        assert_eq!(count(&report, PassName::ExactKey), 0);
        assert_eq!(count(&report, PassName::Substring), 0);
        assert!(p.iter().all(|r| r.external_id.is_none()));
    }

    #[test]
    fn exact_match_wins_over_fuzzy() {
        let mut p = primary(vec![fighter("Charles Oliveira")]);
        let s = secondary(vec![master("Charles Oliveira", "co")]);
        let report = pipeline().run(&mut p, &s);
        assert_eq!(count(&report, PassName::ExactKey), 1);
        assert_eq!(count(&report, PassName::Fuzzy), 0);
        assert_eq!(report.all_results().next().map(|r| r.pass), Some(PassName::ExactKey));
    }

    #[test]
    fn manual_override_only_scenario() {
        let mut p = primary(vec![fighter("Steve Erceg")]);
        let s = secondary(vec![master("Stephen Erceg", "se"), master("Jon Jones", "jj")]);
        let report = pipeline().run(&mut p, &s);
        for pass in [
            PassName::ExactKey,
            PassName::Substring,
            PassName::Fuzzy,
            PassName::BirthDate,
        ] {
            assert_eq!(count(&report, pass), 0, "{pass}");
        }
        assert_eq!(count(&report, PassName::ManualOverride), 1);
        assert_eq!(p.rows()[0].external_id.as_deref(), Some("se"));
    }

    #[test]
    fn shared_birth_date_matches_neither() {
        let mut p = primary(vec![
            fighter_born("Fighter Alpha", (1990, 1, 1)),
            fighter_born("Fighter Bravo", (1990, 1, 1)),
        ]);
        let s = secondary(vec![master_born("Xavier Quill", "xq", (1990, 1, 1))]);
        let report = pipeline().run(&mut p, &s);
        assert_eq!(count(&report, PassName::BirthDate), 0);
        assert_eq!(report.residual.len(), 2);
        assert!(p.iter().all(|r| r.external_id.is_none()));
    }

    #[test]
    fn custom_overrides_from_config() {
        let cfg = ReconcileConfig {
            manual_overrides: vec![ManualOverride {
                scraped_name: "The Korean Zombie".into(),
                master_name: "Chan Sung Jung".into(),
            }],
            ..Default::default()
        };
        let mut p = primary(vec![fighter("The Korean Zombie")]);
        let s = secondary(vec![master("Chan Sung Jung", "csj")]);
        ReconciliationPipeline::from_config(&cfg).run(&mut p, &s);
        assert_eq!(p.rows()[0].external_id.as_deref(), Some("csj"));
    }

    #[test]
    fn summary_file_lists_passes_and_residual() {
        let (mut p, s) = sample();
        let report = pipeline().run(&mut p, &s);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.txt");
        report.write_summary(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("Pass 3: Fuzzy name similarity"));
        assert!(text.contains("Khabib Nurmagomedow"));
        assert!(text.contains("Unmatched fighters: 1"));
        assert!(text.contains("Nobody Known"));
    }
}
