mod attribution;
mod cli;
mod cli_help;
mod config;
mod derivation;
mod dups;
mod fingerprint;
mod fragment;
mod git;
mod inspections;
mod report_helpers;
mod snapshot;

use std::error::Error;

use chrono::Local;
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use config::Config;

/// Log to stderr at `info` (`debug` with `--verbose`); `RUST_LOG` wins.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn dispatch(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Inspections {
            snapshots,
            threshold,
            attribution,
        } => {
            let plan = attribution.plan(&config);
            inspections::run(
                &snapshots.former,
                &snapshots.current,
                threshold.as_deref(),
                &plan,
                snapshots.json,
            )
            .await
        }
        Commands::Duplicates {
            snapshots,
            attribution,
        } => {
            let plan = attribution.plan(&config);
            dups::run(&snapshots.former, &snapshots.current, &plan, snapshots.json).await
        }
        Commands::Derivation {
            branches,
            max_days,
            fetch,
            json,
            git,
        } => derivation::run(&git.settings(&config), &branches, max_days, fetch, json).await,
        Commands::Promote {
            former,
            current,
            archive,
        } => {
            let today = Local::now().date_naive();
            match snapshot::promote(&former, &current, archive.as_deref(), today)? {
                Some(archived) => println!(
                    "Archived {} to {}",
                    former.display(),
                    archived.display()
                ),
                None => println!("No former report to archive"),
            }
            println!("{} is the new baseline", former.display());
            Ok(())
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "inspecta", &mut std::io::stdout());
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = dispatch(cli).await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
