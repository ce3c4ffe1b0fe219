//! Orchestrator module: high-level workflow coordination.
//!
//! This module brackets the matching pipeline with file I/O:
//! - Config validation
//! - Table loading and schema validation (fails before any pass runs)
//! - Reconciliation
//! - Rewriting the primary table
//! - Audit and summary reporting

pub mod propagate;
pub mod summary;

use anyhow::{Context, Result};
use log::info;
use std::path::{Path, PathBuf};

use crate::config::ReconcileConfig;
use crate::export::csv_export::{export_audit_csv, write_primary_table};
use crate::matching::{ReconcileReport, ReconciliationPipeline};
use crate::table::csv_load::{PrimaryLoadOptions, load_primary, load_secondary};
use propagate::{PropagateStats, propagate_attributes};
use summary::Coverage;

/// Everything one `reconcile` invocation needs.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub primary_path: PathBuf,
    pub secondary_path: PathBuf,
    /// Where to write the enriched table; `None` rewrites the primary in place.
    pub out_path: Option<PathBuf>,
    pub audit_csv: Option<PathBuf>,
    pub summary_path: Option<PathBuf>,
    /// Run every pass but write nothing back.
    pub dry_run: bool,
    pub settings: ReconcileConfig,
}

impl RunConfig {
    pub fn new(primary: impl Into<PathBuf>, secondary: impl Into<PathBuf>) -> Self {
        Self {
            primary_path: primary.into(),
            secondary_path: secondary.into(),
            out_path: None,
            audit_csv: None,
            summary_path: None,
            dry_run: false,
            settings: ReconcileConfig::default(),
        }
    }

    pub fn output_path(&self) -> &Path {
        self.out_path.as_deref().unwrap_or(self.primary_path.as_path())
    }
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub report: ReconcileReport,
    pub before: Coverage,
    pub after: Coverage,
}

pub fn run_reconcile(cfg: &RunConfig) -> Result<RunOutcome> {
    cfg.settings.validate()?;
    let opts = PrimaryLoadOptions {
        drop_duplicates: cfg.settings.clean_primary,
        add_missing_columns: cfg.settings.add_missing_columns,
    };
    let mut primary = load_primary(&cfg.primary_path, &cfg.settings.primary_columns, opts)
        .with_context(|| format!("loading primary table {}", cfg.primary_path.display()))?;
    let secondary = load_secondary(&cfg.secondary_path, &cfg.settings.secondary_columns)
        .with_context(|| format!("loading secondary table {}", cfg.secondary_path.display()))?;

    let before = Coverage::of(&primary);
    let pipeline = ReconciliationPipeline::from_config(&cfg.settings);
    let report = pipeline.run(&mut primary, &secondary);
    let after = Coverage::of(&primary);
    after.log("Final");

    if cfg.dry_run {
        info!("Dry run: {} left untouched", cfg.output_path().display());
    } else {
        write_primary_table(&primary, &cfg.settings.primary_columns, cfg.output_path())
            .with_context(|| format!("writing {}", cfg.output_path().display()))?;
        info!("Wrote enriched table to {}", cfg.output_path().display());
    }
    if let Some(path) = &cfg.audit_csv {
        export_audit_csv(report.all_results(), path)
            .with_context(|| format!("writing audit csv {}", path.display()))?;
        info!("Wrote match audit to {}", path.display());
    }
    if let Some(path) = &cfg.summary_path {
        report
            .write_summary(path)
            .and_then(|_| append_coverage(path, &after))
            .with_context(|| format!("writing summary {}", path.display()))?;
        info!("Wrote summary to {}", path.display());
    }

    Ok(RunOutcome {
        report,
        before,
        after,
    })
}

fn append_coverage(path: &Path, coverage: &Coverage) -> std::io::Result<()> {
    let mut f = std::fs::OpenOptions::new().append(true).open(path)?;
    std::io::Write::write_all(&mut f, b"\n")?;
    coverage.write_to(&mut f)
}

/// Copy reach/stance from a reconciled table into `target` (rewritten in place).
pub fn run_propagate(
    source: &Path,
    target: &Path,
    settings: &ReconcileConfig,
) -> Result<PropagateStats> {
    settings.validate()?;
    let cols = &settings.primary_columns;
    let source_table = load_primary(source, cols, PrimaryLoadOptions::default())
        .with_context(|| format!("loading source table {}", source.display()))?;
    let opts = PrimaryLoadOptions {
        drop_duplicates: false,
        add_missing_columns: true,
    };
    let mut target_table = load_primary(target, cols, opts)
        .with_context(|| format!("loading target table {}", target.display()))?;
    let stats = propagate_attributes(
        &source_table,
        &mut target_table,
        &settings.propagate_placeholder,
    );
    write_primary_table(&target_table, cols, target)
        .with_context(|| format!("writing {}", target.display()))?;
    info!("Merged reach and stance into {}", target.display());
    Ok(stats)
}
