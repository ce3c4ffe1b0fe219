use crate::config::ReconcileConfig;
use crate::error::ConfigError;
use crate::orchestrator::RunConfig;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "fighter_reconcile",
    version,
    about = "Reconcile a fighter table against a master fighter dump",
    disable_help_subcommand = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fill reach, stance and external id in PRIMARY from SECONDARY
    Reconcile(ReconcileArgs),
    /// Copy reach and stance from a reconciled table into another by id
    Propagate(PropagateArgs),
    /// Write a .env.template
    EnvTemplate {
        #[arg(value_name = "PATH", default_value = ".env.template")]
        path: PathBuf,
    },
}

#[derive(Args, Debug)]
pub struct ReconcileArgs {
    /// Primary fighter table (CSV), rewritten in place unless --out is given
    #[arg(value_name = "PRIMARY")]
    pub primary: PathBuf,
    /// Master fighter table (CSV)
    #[arg(value_name = "SECONDARY")]
    pub secondary: PathBuf,
    /// Write the enriched table here instead
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,
    /// JSON config file (env: FIGHTER_RECONCILE_CONFIG)
    #[arg(long, value_name = "FILE", env = "FIGHTER_RECONCILE_CONFIG")]
    pub config: Option<PathBuf>,
    /// Fuzzy pass threshold (env: FIGHTER_RECONCILE_FUZZY_THRESHOLD, default 0.85)
    #[arg(
        long = "fuzzy-threshold",
        value_name = "F",
        env = "FIGHTER_RECONCILE_FUZZY_THRESHOLD"
    )]
    pub fuzzy_threshold: Option<f64>,
    /// Write every match made to this CSV
    #[arg(long = "audit-csv", value_name = "PATH")]
    pub audit_csv: Option<PathBuf>,
    /// Write a text summary of the run
    #[arg(long, value_name = "PATH")]
    pub summary: Option<PathBuf>,
    /// Append missing Reach/Stance/id columns to the primary table
    #[arg(long = "add-missing-columns")]
    pub add_missing_columns: bool,
    /// Keep exact duplicate rows of the primary table
    #[arg(long = "no-clean")]
    pub no_clean: bool,
    /// Run all passes without writing the primary table
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

#[derive(Args, Debug)]
pub struct PropagateArgs {
    /// Reconciled fighter table (CSV)
    #[arg(value_name = "SOURCE")]
    pub source: PathBuf,
    /// Fighter table to update in place (CSV)
    #[arg(value_name = "TARGET")]
    pub target: PathBuf,
    /// Value written where the source has nothing (default "-")
    #[arg(long, value_name = "S")]
    pub placeholder: Option<String>,
    /// JSON config file (env: FIGHTER_RECONCILE_CONFIG)
    #[arg(long, value_name = "FILE", env = "FIGHTER_RECONCILE_CONFIG")]
    pub config: Option<PathBuf>,
}

fn base_config(path: Option<&Path>) -> Result<ReconcileConfig, ConfigError> {
    match path {
        Some(p) => ReconcileConfig::from_json_file(p),
        None => Ok(ReconcileConfig::default()),
    }
}

impl ReconcileArgs {
    /// Defaults, then the config file, then flags.
    pub fn to_run_config(&self) -> Result<RunConfig, ConfigError> {
        let mut settings = base_config(self.config.as_deref())?;
        if let Some(t) = self.fuzzy_threshold {
            settings.fuzzy_threshold = t;
        }
        if self.add_missing_columns {
            settings.add_missing_columns = true;
        }
        if self.no_clean {
            settings.clean_primary = false;
        }
        settings.validate()?;

        let mut cfg = RunConfig::new(&self.primary, &self.secondary);
        cfg.out_path = self.out.clone();
        cfg.audit_csv = self.audit_csv.clone();
        cfg.summary_path = self.summary.clone();
        cfg.dry_run = self.dry_run;
        cfg.settings = settings;
        Ok(cfg)
    }
}

impl PropagateArgs {
    pub fn to_config(&self) -> Result<ReconcileConfig, ConfigError> {
        let mut settings = base_config(self.config.as_deref())?;
        if let Some(p) = &self.placeholder {
            settings.propagate_placeholder = p.clone();
        }
        settings.validate()?;
        Ok(settings)
    }
}
