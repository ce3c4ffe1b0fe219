use anyhow::Result;
use clap::Parser;
use log::{error, info};

use fighter_reconcile::cli::{Cli, Command};
use fighter_reconcile::logging::init_logging;
use fighter_reconcile::orchestrator::{run_propagate, run_reconcile};
use fighter_reconcile::util::envfile::{load_dotenv_if_present, write_env_template};

fn main() {
    if let Err(e) = load_dotenv_if_present() {
        eprintln!("Warning: could not read .env: {:#}", e);
    }
    init_logging();
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Reconcile(args) => {
            let cfg = args.to_run_config()?;
            let outcome = run_reconcile(&cfg)?;
            let report = &outcome.report;
            info!(
                "Done: {} new matches, {} fighters still unmatched ({:.2}s)",
                report.total_new_matches(),
                report.residual.len(),
                report.duration_ms as f64 / 1000.0
            );
        }
        Command::Propagate(args) => {
            let settings = args.to_config()?;
            let stats = run_propagate(&args.source, &args.target, &settings)?;
            info!(
                "Done: reach {}/{}, stance {}/{}",
                stats.reach_merged, stats.rows, stats.stance_merged, stats.rows
            );
        }
        Command::EnvTemplate { path } => {
            write_env_template(&path)?;
            println!(
                "Wrote {}. Copy to .env and edit values as needed.",
                path.display()
            );
        }
    }
    Ok(())
}
