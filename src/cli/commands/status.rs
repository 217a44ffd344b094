//! Status command implementation.
//!
//! The `hostprep status` command evaluates every precondition without
//! acting and shows which steps are already satisfied. Read-only by
//! construction: actions and postconditions are never invoked.

use std::path::{Path, PathBuf};

use crate::cli::args::StatusArgs;
use crate::config;
use crate::error::{HostprepError, Result};
use crate::probes;
use crate::ui::Console;

use super::dispatcher::{Command, CommandResult};

/// The status command implementation.
pub struct StatusCommand {
    plan_path: PathBuf,
    args: StatusArgs,
}

impl StatusCommand {
    /// Create a new status command.
    pub fn new(plan_path: &Path, args: StatusArgs) -> Self {
        Self {
            plan_path: plan_path.to_path_buf(),
            args,
        }
    }
}

impl Command for StatusCommand {
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

        let root = config::plan_root(&self.plan_path);
        let mut entries = Vec::new();
        let mut satisfied_count = 0;

        for step in &plan.steps {
            let (satisfied, description) = match &step.precondition {
                None => (false, "no precondition, always runs".to_string()),
                Some(probe) => match probes::evaluate(probe, &root) {
                    Ok(outcome) => (outcome.satisfied, outcome.description),
                    Err(e) => {
                        out.warning(&format!(
                            "{}: precondition could not produce a verdict: {}",
                            step.name, e
                        ));
                        (false, e.to_string())
                    }
                },
            };
            if satisfied {
                satisfied_count += 1;
            }
            entries.push((step.name.clone(), satisfied, description));
        }

        if self.args.json {
            let json: Vec<_> = entries
                .iter()
                .map(|(name, satisfied, description)| {
                    serde_json::json!({
                        "name": name,
                        "satisfied": satisfied,
                        "description": description,
                    })
                })
                .collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&json).map_err(|e| HostprepError::Other(e.into()))?
            );
            return Ok(CommandResult::success());
        }

        out.header(&format!("{} — status", plan.plan_name));
        for (name, satisfied, description) in &entries {
            if *satisfied {
                out.success(&format!("{} ({})", name, description));
            } else {
                out.message(&format!("○ {} ({})", name, description));
            }
        }

        out.message("");
        let pending = plan.steps.len() - satisfied_count;
        out.message(&format!(
            "{} of {} steps already satisfied",
            satisfied_count,
            plan.steps.len()
        ));
        if pending > 0 {
            out.message(&format!("Run `hostprep run` to apply {} step(s)", pending));
        }

        Ok(CommandResult::success())
    }
}
