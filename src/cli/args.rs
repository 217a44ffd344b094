//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Hostprep - idempotent provisioning step runner.
#[derive(Debug, Parser)]
#[command(name = "hostprep")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to plan file (overrides default hostprep.yml)
    #[arg(short, long, global = true)]
    pub plan: Option<PathBuf>,

    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Execute the plan (default if no command specified)
    Run(RunArgs),

    /// Show the plan's steps, policies, and probe/action kinds
    List(ListArgs),

    /// Evaluate every precondition without acting
    Status(StatusArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the `run` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct RunArgs {
    /// Run only specified steps (comma-separated); others are reported
    /// as not attempted
    #[arg(long, value_delimiter = ',')]
    pub only: Vec<String>,

    /// Skip the precondition for specified steps (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    pub force: Vec<String>,

    /// Preview what would run without executing actions
    #[arg(long)]
    pub dry_run: bool,

    /// Print the run report as JSON instead of the human summary
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `list` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ListArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `status` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct StatusArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `completions` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
