//! List command implementation.
//!
//! The `hostprep list` command shows the plan's steps, their policies,
//! and probe/action kinds without evaluating or executing anything.

use std::path::{Path, PathBuf};

use crate::cli::args::ListArgs;
use crate::config::{self, FailurePolicy};
use crate::error::{HostprepError, Result};
use crate::ui::Console;

use super::dispatcher::{Command, CommandResult};

/// The list command implementation.
pub struct ListCommand {
    plan_path: PathBuf,
    args: ListArgs,
}

impl ListCommand {
    /// Create a new list command.
    pub fn new(plan_path: &Path, args: ListArgs) -> Self {
        Self {
            plan_path: plan_path.to_path_buf(),
            args,
        }
    }
}

impl Command for ListCommand {
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

        if self.args.json {
            let entries: Vec<_> = plan
                .steps
                .iter()
                .map(|step| {
                    serde_json::json!({
                        "name": step.name,
                        "description": step.description,
                        "precondition": step.precondition.as_ref().map(|p| p.kind()),
                        "action": step.action.kind(),
                        "postcondition": step.postcondition.as_ref().map(|p| p.kind()),
                        "max_attempts": step.retry.max_attempts,
                        "on_failure": step.on_failure,
                    })
                })
                .collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&entries)
                    .map_err(|e| HostprepError::Other(e.into()))?
            );
            return Ok(CommandResult::success());
        }

        out.header(&format!("{} — {} steps", plan.plan_name, plan.steps.len()));
        for (index, step) in plan.steps.iter().enumerate() {
            let policy = match step.on_failure {
                FailurePolicy::Abort => "abort on failure",
                FailurePolicy::Continue => "continue on failure",
            };
            out.message(&format!("{:>3}. {}", index + 1, step.name));
            if let Some(description) = &step.description {
                out.message(&format!("     {}", description));
            }
            out.message(&format!("     action: {}", step.action.summary()));
            if let Some(precondition) = &step.precondition {
                out.message(&format!("     precondition: {}", precondition.kind()));
            }
            if let Some(postcondition) = &step.postcondition {
                out.message(&format!("     postcondition: {}", postcondition.kind()));
            }
            out.verbose(&format!(
                "     attempts: {}, {}",
                step.retry.max_attempts, policy
            ));
        }

        Ok(CommandResult::success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::MockConsole;
    use std::fs;
    use tempfile::TempDir;

    const PLAN: &str = r#"
plan_name: ai-host
steps:
  - name: node
    description: Node.js runtime
    precondition:
      type: binary_installed
      name: node
    action:
      type: command
      command: apt-get install -y nodejs
  - name: model
    on_failure: continue
    action:
      type: command
      command: ollama pull llama3
"#;

    fn write_plan() -> (TempDir, PathBuf) {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("hostprep.yml");
        fs::write(&path, PLAN).unwrap();
        (temp, path)
    }

    #[test]
    fn list_shows_steps_and_kinds() {
        let (_temp, path) = write_plan();
        let cmd = ListCommand::new(&path, ListArgs::default());
        let mut out = MockConsole::new();

        let result = cmd.execute(&mut out).unwrap();
        assert!(result.success);

        let all = out.all_output();
        assert!(all.contains("node"));
        assert!(all.contains("model"));
        assert!(all.contains("precondition: binary_installed"));
        assert!(all.contains("2 steps"));
    }

    #[test]
    fn list_missing_plan_exits_2() {
        let temp = TempDir::new().unwrap();
        let cmd = ListCommand::new(&temp.path().join("hostprep.yml"), ListArgs::default());
        let mut out = MockConsole::new();

        let result = cmd.execute(&mut out).unwrap();
        assert_eq!(result.exit_code, 2);
    }
}
