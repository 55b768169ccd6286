/// CLI argument definitions for the `inspecta` command.
///
/// Defines all subcommands and their arguments using the `clap` derive
/// macros. Flags given here override `inspecta.toml`.
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::attribution::AttributionPlan;
use crate::cli_help;
use crate::config::{Config, GitSettings};

/// Top-level CLI parser with a single subcommand selector.
#[derive(Parser)]
#[command(
    name = "inspecta",
    version,
    about = "Inspection and duplicate report diffing with git-based attribution"
)]
pub struct Cli {
    /// Configuration file (default: inspecta.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log debug output to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// The two report snapshots to compare.
#[derive(Args)]
pub struct SnapshotArgs {
    /// Former report (missing means empty baseline)
    #[arg(long)]
    pub former: PathBuf,

    /// Current report
    #[arg(long)]
    pub current: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Repository overrides shared by every git-backed command.
#[derive(Args)]
pub struct GitArgs {
    /// Repository working tree (default: current directory)
    #[arg(long)]
    pub repo: Option<PathBuf>,

    /// Trunk branch (default: develop)
    #[arg(long)]
    pub trunk: Option<String>,

    /// Remote used to qualify branches, empty for none (default: origin)
    #[arg(long)]
    pub remote: Option<String>,
}

impl GitArgs {
    pub fn settings(&self, config: &Config) -> GitSettings {
        let mut settings = config.git.clone();
        if let Some(repo) = &self.repo {
            settings.repository = repo.display().to_string();
        }
        if let Some(trunk) = &self.trunk {
            settings.trunk = trunk.clone();
        }
        if let Some(remote) = &self.remote {
            settings.remote = remote.clone();
        }
        settings
    }
}

/// Contributor attribution options.
#[derive(Args)]
pub struct AttributionArgs {
    /// Commit the current report was produced from; enables attribution
    #[arg(long)]
    pub head: Option<String>,

    /// Commit the former report was produced from; enables removal credits
    #[arg(long, requires = "head")]
    pub base: Option<String>,

    /// Show only the top N contributors (default: 5)
    #[arg(long)]
    pub top: Option<usize>,

    /// Prefix turning report paths into repository paths
    #[arg(long)]
    pub path_prefix: Option<String>,

    #[command(flatten)]
    pub git: GitArgs,
}

impl AttributionArgs {
    pub fn plan(&self, config: &Config) -> AttributionPlan {
        AttributionPlan {
            git: self.git.settings(config),
            base: self.base.clone(),
            head: self.head.clone(),
            top: self.top.unwrap_or(config.attribution.top),
            path_prefix: self
                .path_prefix
                .clone()
                .unwrap_or_else(|| config.attribution.path_prefix.clone()),
        }
    }
}

/// All available subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Diff two inspection reports
    #[command(long_about = cli_help::INSPECTIONS)]
    Inspections {
        #[command(flatten)]
        snapshots: SnapshotArgs,

        /// Per-project thresholds (CSV: Project;InspectionsThreshold)
        #[arg(long)]
        threshold: Option<PathBuf>,

        #[command(flatten)]
        attribution: AttributionArgs,
    },

    /// Diff two duplicate-code reports
    #[command(long_about = cli_help::DUPLICATES)]
    Duplicates {
        #[command(flatten)]
        snapshots: SnapshotArgs,

        #[command(flatten)]
        attribution: AttributionArgs,
    },

    /// Check how long ago branches merged the trunk
    #[command(long_about = cli_help::DERIVATION)]
    Derivation {
        /// Branches to check
        #[arg(required = true)]
        branches: Vec<String>,

        /// Days after which a branch is derived (default: 7)
        #[arg(long, default_value = "7")]
        max_days: i64,

        /// Run `git fetch --prune` first
        #[arg(long)]
        fetch: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        git: GitArgs,
    },

    /// Make the current report the new baseline
    #[command(long_about = cli_help::PROMOTE)]
    Promote {
        /// Baseline report to replace
        #[arg(long)]
        former: PathBuf,

        /// Report becoming the baseline
        #[arg(long)]
        current: PathBuf,

        /// Directory receiving a dated copy of the replaced baseline
        #[arg(long)]
        archive: Option<PathBuf>,
    },

    /// Generate shell completion script
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}
