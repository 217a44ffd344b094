//! Run command implementation.
//!
//! The `hostprep run` command executes the plan and renders a run
//! summary. The exit code is 0 iff no step ended failed.

use std::path::{Path, PathBuf};

use crate::cli::args::RunArgs;
use crate::config::{self, Step};
use crate::error::{HostprepError, Result};
use crate::runner::{RunObserver, RunOptions, StepRecord, StepRunner, StepStatus};
use crate::ui::{summary, Console, StepSpinner};

use super::dispatcher::{Command, CommandResult};

/// The run command implementation.
pub struct RunCommand {
    plan_path: PathBuf,
    args: RunArgs,
}

impl RunCommand {
    /// Create a new run command.
    pub fn new(plan_path: &Path, args: RunArgs) -> Self {
        Self {
            plan_path: plan_path.to_path_buf(),
            args,
        }
    }
}

impl Command for RunCommand {
    fn execute(&self, out: &mut dyn Console) -> Result<CommandResult> {
        let plan = match config::load_plan(&self.plan_path) {
            Ok(p) => p,
            Err(HostprepError::PlanNotFound { path }) => {
                out.error(&format!(
                    "No plan found at {}. Create one or pass --plan.",
                    path.display()
                ));
                return Ok(CommandResult::failure(2));
            }
            Err(e) => return Err(e),
        };
        config::validate(&plan)?;

        if !self.args.json {
            out.header(&plan.plan_name);
            if self.args.dry_run {
                out.message("dry-run mode: actions will not be executed");
            }
        }

        let runner = StepRunner::new(&plan, config::plan_root(&self.plan_path));
        let options = RunOptions {
            only: self.args.only.clone(),
            force: self.args.force.clone(),
            dry_run: self.args.dry_run,
            cancel: None,
        };

        let interactive = console::user_attended() && !out.is_quiet();
        let report = {
            let mut observer = ConsoleObserver {
                out: &mut *out,
                spinner: None,
                interactive,
            };
            runner.run_with_observer(&options, &mut observer)?
        };

        if self.args.json {
            println!("{}", summary::render_json(&report)?);
        } else {
            summary::render_summary(&report, out);
        }

        if report.success() {
            Ok(CommandResult::success())
        } else {
            Ok(CommandResult::failure(1))
        }
    }
}

/// Renders per-step progress while the runner works.
struct ConsoleObserver<'a> {
    out: &'a mut dyn Console,
    spinner: Option<StepSpinner>,
    interactive: bool,
}

impl RunObserver for ConsoleObserver<'_> {
    fn step_started(&mut self, index: usize, total: usize, step: &Step) {
        let label = format!("[{}/{}] {}", index + 1, total, step.name);
        if self.interactive {
            self.spinner = Some(StepSpinner::new(&format!(
                "{} — {}",
                label,
                step.action.summary()
            )));
        } else {
            self.out.verbose(&label);
        }
    }

    fn attempt_failed(&mut self, step: &Step, attempt: u32, max_attempts: u32, error: &str) {
        if attempt >= max_attempts {
            return;
        }
        let msg = format!(
            "{}: attempt {}/{} failed, retrying — {}",
            step.name, attempt, max_attempts, error
        );
        match &mut self.spinner {
            Some(spinner) => spinner.set_message(&msg),
            None => self.out.warning(&msg),
        }
    }

    fn step_finished(&mut self, record: &StepRecord) {
        let line: String = record.summary_line().chars().skip(2).collect();
        if let Some(spinner) = self.spinner.take() {
            match record.status {
                StepStatus::Succeeded => spinner.finish_success(&line),
                StepStatus::Skipped => spinner.finish_skipped(&line),
                StepStatus::Failed => spinner.finish_error(&line),
                StepStatus::NotAttempted => spinner.finish_dim(&line),
            }
        } else {
            match record.status {
                StepStatus::Succeeded => self.out.success(&line),
                StepStatus::Skipped => self.out.skipped(&line),
                StepStatus::Failed => self.out.error(&line),
                StepStatus::NotAttempted => self.out.verbose(&line),
            }
        }
    }
}
