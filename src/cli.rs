//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI parser for `converge`.
#[derive(Debug, Parser)]
#[command(
    name = "converge",
    version,
    about = "Reconcile network devices with their intended configuration"
)]
pub struct Cli {
    /// Settings file. Defaults to $CONVERGE_CONFIG, then ./converge.yaml.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Log at debug level unless CONVERGE_LOG or RUST_LOG say otherwise.
    #[arg(short, long, global = true)]
    pub verbose: bool,
    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Reconcile one target with explicit options (preview unless --apply).
    Reconcile {
        /// Target id in the inventory.
        target: String,
        /// Apply the changes instead of previewing them.
        #[arg(long)]
        apply: bool,
        /// Replace the whole configuration instead of merging into it.
        #[arg(long)]
        replace: bool,
        /// Stage and diff the changes but discard them instead of committing.
        #[arg(long)]
        no_commit: bool,
    },
    /// Reconcile one target with the configured pre-bound options.
    Provision {
        /// Target id in the inventory.
        target: String,
    },
    /// Feed change events from a JSON-lines file through the hook trigger.
    Watch {
        /// File with one change event per line.
        #[arg(long, value_name = "FILE")]
        events: PathBuf,
    },
    /// Print the intended configuration of a target without connecting.
    Render {
        /// Target id in the inventory.
        target: String,
    },
    /// Report whether a target is ready to be reconciled.
    Check {
        /// Target id in the inventory.
        target: String,
    },
}
