//! Command dispatching.
//!
//! This module provides the core command infrastructure:
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`CommandDispatcher`] for routing CLI subcommands

use std::path::{Path, PathBuf};

use crate::cli::args::{Cli, Commands};
use crate::error::Result;
use crate::ui::Console;

/// Trait for command implementations.
pub trait Command {
    /// Execute the command.
    ///
    /// # Arguments
    ///
    /// * `out` - Console for displaying output
    ///
    /// # Returns
    ///
    /// A [`CommandResult`] indicating success/failure and exit code.
    fn execute(&self, out: &mut dyn Console) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,

    /// Exit code to use (0 for success, non-zero for failure).
    pub exit_code: i32,
}

impl CommandResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: 0,
        }
    }

    /// Create a failure result.
    pub fn failure(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }
}

/// Dispatches CLI commands to their implementations.
pub struct CommandDispatcher {
    plan_path: PathBuf,
}

impl CommandDispatcher {
    /// Create a new dispatcher for the given plan path.
    pub fn new(plan_path: PathBuf) -> Self {
        Self { plan_path }
    }

    /// Get the plan path.
    pub fn plan_path(&self) -> &Path {
        &self.plan_path
    }

    /// Dispatch and execute a command.
    ///
    /// Routes the CLI subcommand to the appropriate command
    /// implementation and executes it. No subcommand defaults to `run`.
    pub fn dispatch(&self, cli: &Cli, out: &mut dyn Console) -> Result<CommandResult> {
        match &cli.command {
            Some(Commands::Run(args)) => {
                let cmd = super::run::RunCommand::new(&self.plan_path, args.clone());
                cmd.execute(out)
            }
            Some(Commands::List(args)) => {
                let cmd = super::list::ListCommand::new(&self.plan_path, args.clone());
                cmd.execute(out)
            }
            Some(Commands::Status(args)) => {
                let cmd = super::status::StatusCommand::new(&self.plan_path, args.clone());
                cmd.execute(out)
            }
            Some(Commands::Completions(args)) => {
                let cmd = super::completions::CompletionsCommand::new(args.clone());
                cmd.execute(out)
            }
            None => {
                let cmd = super::run::RunCommand::new(
                    &self.plan_path,
                    crate::cli::args::RunArgs::default(),
                );
                cmd.execute(out)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_result_success() {
        let result = CommandResult::success();
        assert!(result.success);
        assert_eq!(result.exit_code, 0);
    }

    #[test]
    fn command_result_failure() {
        let result = CommandResult::failure(1);
        assert!(!result.success);
        assert_eq!(result.exit_code, 1);
    }

    #[test]
    fn dispatcher_creation() {
        let dispatcher = CommandDispatcher::new(PathBuf::from("/srv/hostprep.yml"));
        assert_eq!(dispatcher.plan_path(), Path::new("/srv/hostprep.yml"));
    }
}
