//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI parser for `mend`.
#[derive(Debug, Parser)]
#[command(name = "mend", version, about = "Run test classes and repair the ones that fail")]
pub struct Cli {
    /// Project root containing the build descriptors and test sources.
    #[arg(long, global = true, default_value = ".", env = "MEND_PROJECT_ROOT")]
    pub project_root: PathBuf,

    /// Configuration file. Defaults to `.mend/config.yaml` under the project root.
    #[arg(long, global = true, env = "MEND_CONFIG")]
    pub config: Option<PathBuf>,

    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Execute test classes, repairing failures within the retry budget.
    Run {
        /// Fully-qualified test class names.
        #[arg(required = true, value_name = "CLASS")]
        classes: Vec<String>,

        /// Repair attempts per failing class, overriding the configuration.
        #[arg(long)]
        max_retries: Option<u32>,
    },
    /// Show execution and remediation history from the stored test structure.
    Status {
        /// Only show methods of this fully-qualified class.
        #[arg(long)]
        class: Option<String>,
    },
    /// Rescan the project regardless of the update policy.
    Rebuild,
}
