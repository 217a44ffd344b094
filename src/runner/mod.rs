//! Step execution engine.
//!
//! Runs a plan's steps strictly sequentially in declaration order. For
//! each step: evaluate the precondition (satisfied means skip), then
//! attempt action + postcondition under the step's retry policy. An
//! attempt counts as successful only if the action reports success AND
//! the postcondition holds. A failed abort-policy step halts the run;
//! the remaining steps are recorded as not attempted.
//!
//! There is no rollback. A failed step leaves partial side effects in
//! place; re-running the plan relies on preconditions to skip state
//! that is already good.

pub mod report;

pub use report::{format_duration, RunReport, StepRecord, StepStatus};

use crate::config::{FailurePolicy, Plan, Step};
use crate::error::{HostprepError, Result};
use crate::{actions, exec, probes};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Options for one plan execution.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Run only these steps; everything else is recorded as not attempted.
    pub only: Vec<String>,

    /// Skip precondition evaluation for these steps.
    pub force: Vec<String>,

    /// Resolve and report what would run without executing actions.
    pub dry_run: bool,

    /// Cancellation signal, checked between steps. An in-flight action
    /// is never interrupted; steps not yet started are recorded as not
    /// attempted.
    pub cancel: Option<Arc<AtomicBool>>,
}

impl RunOptions {
    fn cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(false)
    }
}

/// Callbacks for rendering run progress. All methods default to no-ops.
pub trait RunObserver {
    /// A step is about to be evaluated.
    fn step_started(&mut self, index: usize, total: usize, step: &Step) {
        let _ = (index, total, step);
    }

    /// An attempt failed; more attempts may follow.
    fn attempt_failed(&mut self, step: &Step, attempt: u32, max_attempts: u32, error: &str) {
        let _ = (step, attempt, max_attempts, error);
    }

    /// A step reached its final status.
    fn step_finished(&mut self, record: &StepRecord) {
        let _ = record;
    }
}

struct NoopObserver;

impl RunObserver for NoopObserver {}

/// Executes a plan's steps and produces a [`RunReport`].
pub struct StepRunner<'a> {
    plan: &'a Plan,
    root: PathBuf,
}

impl<'a> StepRunner<'a> {
    /// Create a runner for a plan rooted at the given directory.
    pub fn new(plan: &'a Plan, root: impl Into<PathBuf>) -> Self {
        Self {
            plan,
            root: root.into(),
        }
    }

    /// Execute the plan without progress callbacks.
    pub fn run(&self, options: &RunOptions) -> Result<RunReport> {
        self.run_with_observer(options, &mut NoopObserver)
    }

    /// Execute the plan, reporting progress through the observer.
    ///
    /// The report always contains one record per plan step, in
    /// declaration order.
    pub fn run_with_observer(
        &self,
        options: &RunOptions,
        observer: &mut dyn RunObserver,
    ) -> Result<RunReport> {
        for name in options.only.iter().chain(options.force.iter()) {
            if self.plan.step(name).is_none() {
                return Err(HostprepError::UnknownStep { name: name.clone() });
            }
        }

        let mut report = RunReport::new(&self.plan.plan_name);
        let total = self.plan.steps.len();
        let mut halted_by: Option<String> = None;

        for (index, step) in self.plan.steps.iter().enumerate() {
            if let Some(failed) = &halted_by {
                let record =
                    StepRecord::not_attempted(&step.name, format!("halted after '{}' failed", failed));
                observer.step_finished(&record);
                report.push(record);
                continue;
            }

            if !options.only.is_empty() && !options.only.iter().any(|n| n == &step.name) {
                let record = StepRecord::not_attempted(&step.name, "not selected");
                observer.step_finished(&record);
                report.push(record);
                continue;
            }

            if options.cancelled() {
                tracing::debug!(step = %step.name, "run cancelled, step not started");
                let record = StepRecord::not_attempted(&step.name, "cancelled");
                observer.step_finished(&record);
                report.push(record);
                continue;
            }

            observer.step_started(index, total, step);
            let record = self.execute_step(step, options, observer);

            if record.status == StepStatus::Failed && step.on_failure == FailurePolicy::Abort {
                halted_by = Some(step.name.clone());
            }

            observer.step_finished(&record);
            report.push(record);
        }

        Ok(report)
    }

    /// Run one step to its final status. Retryable errors are contained
    /// here; they surface only as the step's failure detail.
    fn execute_step(
        &self,
        step: &Step,
        options: &RunOptions,
        observer: &mut dyn RunObserver,
    ) -> StepRecord {
        let start = Instant::now();
        let forced = options.force.iter().any(|n| n == &step.name);

        if forced {
            tracing::debug!(step = %step.name, "precondition skipped (--force)");
        } else if let Some(precondition) = &step.precondition {
            match probes::evaluate(precondition, &self.root) {
                Ok(outcome) if outcome.satisfied => {
                    tracing::debug!(step = %step.name, "precondition satisfied, skipping");
                    return StepRecord::skipped(&step.name, outcome.description);
                }
                Ok(outcome) => {
                    tracing::debug!(step = %step.name, "precondition unsatisfied: {}", outcome.description);
                }
                // A precondition that cannot produce a verdict is never
                // read as satisfied; the step runs.
                Err(e) => {
                    tracing::warn!(
                        step = %step.name,
                        "precondition could not produce a verdict, treating as needs-action: {}",
                        e
                    );
                }
            }
        }

        if options.dry_run {
            return StepRecord::not_attempted(
                &step.name,
                format!("would run: {}", step.action.summary()),
            );
        }

        let mut env = self.plan.settings.env.clone();
        env.extend(step.env.iter().map(|(k, v)| (k.clone(), v.clone())));

        let max_attempts = step.retry.max_attempts.max(1);
        let mut last_error = String::from("no attempts made");

        for attempt in 1..=max_attempts {
            match self.attempt(step, &env) {
                Ok(()) => {
                    return StepRecord::succeeded(&step.name, attempt, start.elapsed());
                }
                Err(e) => {
                    last_error = e.to_string();
                    match &e {
                        HostprepError::PostconditionFailed { .. } => {
                            tracing::warn!(
                                step = %step.name,
                                "attempt {}/{}: action reported success but verification failed: {}",
                                attempt, max_attempts, last_error
                            );
                        }
                        _ => {
                            tracing::warn!(
                                step = %step.name,
                                "attempt {}/{} failed: {}",
                                attempt, max_attempts, last_error
                            );
                        }
                    }
                    observer.attempt_failed(step, attempt, max_attempts, &last_error);

                    if attempt < max_attempts {
                        let delay = step.retry.backoff.delay_after(attempt);
                        if !delay.is_zero() {
                            std::thread::sleep(delay);
                        }
                    }
                }
            }
        }

        StepRecord::failed(&step.name, max_attempts, start.elapsed(), last_error)
    }

    /// One attempt: action, then postcondition.
    fn attempt(&self, step: &Step, env: &HashMap<String, String>) -> Result<()> {
        let result = actions::run_action(&step.action, &self.root, env).map_err(|e| {
            HostprepError::ActionFailed {
                step: step.name.clone(),
                message: e.to_string(),
            }
        })?;

        if !result.success {
            let message = match exec::stderr_tail(&result) {
                Some(tail) => format!("exit code {:?}: {}", result.exit_code, tail),
                None => format!("exit code {:?}", result.exit_code),
            };
            return Err(HostprepError::ActionFailed {
                step: step.name.clone(),
                message,
            });
        }

        if let Some(postcondition) = &step.postcondition {
            match probes::evaluate(postcondition, &self.root) {
                Ok(outcome) if outcome.satisfied => {}
                Ok(outcome) => {
                    let message = match &outcome.details {
                        Some(details) => format!("{} ({})", outcome.description, details),
                        None => outcome.description,
                    };
                    return Err(HostprepError::PostconditionFailed {
                        step: step.name.clone(),
                        message,
                    });
                }
                Err(e) => {
                    return Err(HostprepError::PostconditionFailed {
                        step: step.name.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::Action;
    use crate::config::{RetryPolicy, Settings};
    use crate::probes::Probe;
    use tempfile::TempDir;

    fn plan_with_steps(steps: Vec<Step>) -> Plan {
        Plan {
            plan_name: "test".to_string(),
            settings: Settings::default(),
            steps,
        }
    }

    fn command_step(name: &str, command: &str) -> Step {
        Step {
            name: name.to_string(),
            action: Action::Command {
                command: command.to_string(),
            },
            ..Default::default()
        }
    }

    fn file_precondition(path: &str) -> Option<Probe> {
        Some(Probe::FileExists {
            path: path.to_string(),
        })
    }

    #[test]
    fn runs_steps_in_declaration_order() {
        let temp = TempDir::new().unwrap();
        let plan = plan_with_steps(vec![
            command_step("first", "echo 1 >> order.txt"),
            command_step("second", "echo 2 >> order.txt"),
        ]);

        let runner = StepRunner::new(&plan, temp.path());
        let report = runner.run(&RunOptions::default()).unwrap();

        assert!(report.success());
        assert_eq!(report.records.len(), 2);
        let order = std::fs::read_to_string(temp.path().join("order.txt")).unwrap();
        assert_eq!(order.lines().collect::<Vec<_>>(), vec!["1", "2"]);
    }

    #[test]
    fn report_length_always_matches_step_count() {
        let temp = TempDir::new().unwrap();
        let mut abort_step = command_step("fails", "exit 1");
        abort_step.on_failure = FailurePolicy::Abort;
        let plan = plan_with_steps(vec![
            abort_step,
            command_step("after1", "true"),
            command_step("after2", "true"),
        ]);

        let runner = StepRunner::new(&plan, temp.path());
        let report = runner.run(&RunOptions::default()).unwrap();

        assert_eq!(report.records.len(), plan.steps.len());
        assert_eq!(
            report.records.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
            vec!["fails", "after1", "after2"]
        );
    }

    #[test]
    fn satisfied_precondition_skips_without_running_action() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("marker.txt"), "").unwrap();

        let mut step = command_step("guarded", "echo ran >> actions.log");
        step.precondition = file_precondition("marker.txt");
        let plan = plan_with_steps(vec![step]);

        let runner = StepRunner::new(&plan, temp.path());
        let report = runner.run(&RunOptions::default()).unwrap();

        assert_eq!(report.records[0].status, StepStatus::Skipped);
        assert_eq!(report.records[0].attempts, 0);
        assert!(!temp.path().join("actions.log").exists());
    }

    #[test]
    fn force_bypasses_satisfied_precondition() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("marker.txt"), "").unwrap();

        let mut step = command_step("guarded", "echo ran >> actions.log");
        step.precondition = file_precondition("marker.txt");
        let plan = plan_with_steps(vec![step]);

        let runner = StepRunner::new(&plan, temp.path());
        let options = RunOptions {
            force: vec!["guarded".to_string()],
            ..Default::default()
        };
        let report = runner.run(&options).unwrap();

        assert_eq!(report.records[0].status, StepStatus::Succeeded);
        assert!(temp.path().join("actions.log").exists());
    }

    #[test]
    fn precondition_probe_error_is_treated_as_needs_action() {
        let temp = TempDir::new().unwrap();

        let mut step = command_step("guarded", "touch ran.txt");
        // Invalid regex: the probe errors instead of returning a verdict.
        step.precondition = Some(Probe::OutputMatches {
            command: "echo hello".to_string(),
            pattern: "(".to_string(),
        });
        let plan = plan_with_steps(vec![step]);

        let runner = StepRunner::new(&plan, temp.path());
        let report = runner.run(&RunOptions::default()).unwrap();

        // Never silently satisfied: the action must have run.
        assert_eq!(report.records[0].status, StepStatus::Succeeded);
        assert!(temp.path().join("ran.txt").exists());
    }

    #[test]
    fn postcondition_failure_is_not_masked_by_action_success() {
        let temp = TempDir::new().unwrap();

        let mut step = command_step("liar", "exit 0");
        step.postcondition = file_precondition("never-created.txt");
        step.retry = RetryPolicy {
            max_attempts: 2,
            ..Default::default()
        };
        step.on_failure = FailurePolicy::Continue;
        let plan = plan_with_steps(vec![step]);

        let runner = StepRunner::new(&plan, temp.path());
        let report = runner.run(&RunOptions::default()).unwrap();

        let record = &report.records[0];
        assert_eq!(record.status, StepStatus::Failed);
        assert_eq!(record.attempts, 2);
        assert!(record.detail.as_deref().unwrap().contains("verification failed"));
    }

    #[test]
    fn abort_step_failure_halts_the_run() {
        let temp = TempDir::new().unwrap();

        let mut failing = command_step("required", "exit 1");
        failing.on_failure = FailurePolicy::Abort;
        let plan = plan_with_steps(vec![
            command_step("before", "true"),
            failing,
            command_step("after", "touch after.txt"),
        ]);

        let runner = StepRunner::new(&plan, temp.path());
        let report = runner.run(&RunOptions::default()).unwrap();

        assert_eq!(report.records[0].status, StepStatus::Succeeded);
        assert_eq!(report.records[1].status, StepStatus::Failed);
        assert_eq!(report.records[2].status, StepStatus::NotAttempted);
        assert!(report.records[2]
            .detail
            .as_deref()
            .unwrap()
            .contains("required"));
        assert!(!temp.path().join("after.txt").exists());
    }

    #[test]
    fn continue_step_failure_lets_later_steps_run() {
        let temp = TempDir::new().unwrap();

        let mut failing = command_step("optional", "exit 1");
        failing.on_failure = FailurePolicy::Continue;
        let plan = plan_with_steps(vec![failing, command_step("after", "touch after.txt")]);

        let runner = StepRunner::new(&plan, temp.path());
        let report = runner.run(&RunOptions::default()).unwrap();

        assert_eq!(report.records[0].status, StepStatus::Failed);
        assert_eq!(report.records[1].status, StepStatus::Succeeded);
        assert!(temp.path().join("after.txt").exists());
    }

    #[test]
    fn retries_until_action_and_postcondition_both_pass() {
        let temp = TempDir::new().unwrap();

        // Fails until the third invocation has appended three lines.
        let mut step = command_step(
            "flaky",
            "echo x >> count.txt; test $(wc -l < count.txt) -ge 3",
        );
        step.retry = RetryPolicy {
            max_attempts: 3,
            ..Default::default()
        };
        let plan = plan_with_steps(vec![step]);

        let runner = StepRunner::new(&plan, temp.path());
        let report = runner.run(&RunOptions::default()).unwrap();

        let record = &report.records[0];
        assert_eq!(record.status, StepStatus::Succeeded);
        assert_eq!(record.attempts, 3);
        let count = std::fs::read_to_string(temp.path().join("count.txt")).unwrap();
        assert_eq!(count.lines().count(), 3);
    }

    #[test]
    fn only_subset_records_unselected_steps_as_not_attempted() {
        let temp = TempDir::new().unwrap();
        let plan = plan_with_steps(vec![
            command_step("a", "touch a.txt"),
            command_step("b", "touch b.txt"),
        ]);

        let runner = StepRunner::new(&plan, temp.path());
        let options = RunOptions {
            only: vec!["b".to_string()],
            ..Default::default()
        };
        let report = runner.run(&options).unwrap();

        assert_eq!(report.records[0].status, StepStatus::NotAttempted);
        assert_eq!(report.records[0].detail.as_deref(), Some("not selected"));
        assert_eq!(report.records[1].status, StepStatus::Succeeded);
        assert!(!temp.path().join("a.txt").exists());
        assert!(temp.path().join("b.txt").exists());
    }

    #[test]
    fn unknown_step_in_only_is_an_error() {
        let temp = TempDir::new().unwrap();
        let plan = plan_with_steps(vec![command_step("a", "true")]);

        let runner = StepRunner::new(&plan, temp.path());
        let options = RunOptions {
            only: vec!["nonexistent".to_string()],
            ..Default::default()
        };
        let err = runner.run(&options).unwrap_err();
        assert!(matches!(err, HostprepError::UnknownStep { .. }));
    }

    #[test]
    fn cancellation_marks_unstarted_steps_not_attempted() {
        let temp = TempDir::new().unwrap();
        let plan = plan_with_steps(vec![
            command_step("a", "true"),
            command_step("b", "touch b.txt"),
        ]);

        let cancel = Arc::new(AtomicBool::new(true));
        let runner = StepRunner::new(&plan, temp.path());
        let options = RunOptions {
            cancel: Some(cancel),
            ..Default::default()
        };
        let report = runner.run(&options).unwrap();

        assert_eq!(report.records[0].status, StepStatus::NotAttempted);
        assert_eq!(report.records[0].detail.as_deref(), Some("cancelled"));
        assert_eq!(report.records[1].status, StepStatus::NotAttempted);
        assert!(!temp.path().join("b.txt").exists());
    }

    #[test]
    fn dry_run_previews_without_executing() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("marker.txt"), "").unwrap();

        let mut satisfied = command_step("done", "touch x.txt");
        satisfied.precondition = file_precondition("marker.txt");
        let plan = plan_with_steps(vec![satisfied, command_step("pending", "touch y.txt")]);

        let runner = StepRunner::new(&plan, temp.path());
        let options = RunOptions {
            dry_run: true,
            ..Default::default()
        };
        let report = runner.run(&options).unwrap();

        assert_eq!(report.records[0].status, StepStatus::Skipped);
        assert_eq!(report.records[1].status, StepStatus::NotAttempted);
        assert!(report.records[1]
            .detail
            .as_deref()
            .unwrap()
            .starts_with("would run:"));
        assert!(!temp.path().join("y.txt").exists());
    }

    #[test]
    fn actions_receive_merged_environment() {
        let temp = TempDir::new().unwrap();

        let mut plan = plan_with_steps(vec![command_step(
            "env",
            "echo $GLOBAL_VAR-$STEP_VAR > env.txt",
        )]);
        plan.settings
            .env
            .insert("GLOBAL_VAR".to_string(), "global".to_string());
        plan.settings
            .env
            .insert("STEP_VAR".to_string(), "shadowed".to_string());
        plan.steps[0]
            .env
            .insert("STEP_VAR".to_string(), "step".to_string());

        let runner = StepRunner::new(&plan, temp.path());
        runner.run(&RunOptions::default()).unwrap();

        let content = std::fs::read_to_string(temp.path().join("env.txt")).unwrap();
        assert!(content.contains("global-step"));
    }

    #[test]
    fn failed_record_names_the_last_error() {
        let temp = TempDir::new().unwrap();

        let mut step = command_step("noisy", "echo transient >&2; exit 7");
        step.on_failure = FailurePolicy::Continue;
        let plan = plan_with_steps(vec![step]);

        let runner = StepRunner::new(&plan, temp.path());
        let report = runner.run(&RunOptions::default()).unwrap();

        let detail = report.records[0].detail.as_deref().unwrap();
        assert!(detail.contains("7"));
        assert!(detail.contains("transient"));
    }

    #[test]
    fn observer_sees_unselected_steps_as_not_attempted() {
        struct Finished(Vec<(String, StepStatus)>);

        impl RunObserver for Finished {
            fn step_finished(&mut self, record: &StepRecord) {
                self.0.push((record.name.clone(), record.status));
            }
        }

        let temp = TempDir::new().unwrap();
        let plan = plan_with_steps(vec![
            command_step("a", "true"),
            command_step("b", "true"),
        ]);

        let runner = StepRunner::new(&plan, temp.path());
        let options = RunOptions {
            only: vec!["b".to_string()],
            ..Default::default()
        };
        let mut observer = Finished(Vec::new());
        runner.run_with_observer(&options, &mut observer).unwrap();

        assert_eq!(
            observer.0,
            vec![
                ("a".to_string(), StepStatus::NotAttempted),
                ("b".to_string(), StepStatus::Succeeded),
            ]
        );
    }

    #[test]
    fn observer_sees_start_retry_and_finish() {
        #[derive(Default)]
        struct Recording {
            started: Vec<String>,
            retries: Vec<u32>,
            finished: Vec<StepStatus>,
        }

        impl RunObserver for Recording {
            fn step_started(&mut self, _index: usize, _total: usize, step: &Step) {
                self.started.push(step.name.clone());
            }
            fn attempt_failed(&mut self, _step: &Step, attempt: u32, _max: u32, _error: &str) {
                self.retries.push(attempt);
            }
            fn step_finished(&mut self, record: &StepRecord) {
                self.finished.push(record.status);
            }
        }

        let temp = TempDir::new().unwrap();
        let mut flaky = command_step("flaky", "exit 1");
        flaky.retry = RetryPolicy {
            max_attempts: 2,
            ..Default::default()
        };
        flaky.on_failure = FailurePolicy::Continue;
        let plan = plan_with_steps(vec![flaky, command_step("ok", "true")]);

        let runner = StepRunner::new(&plan, temp.path());
        let mut observer = Recording::default();
        runner
            .run_with_observer(&RunOptions::default(), &mut observer)
            .unwrap();

        assert_eq!(observer.started, vec!["flaky", "ok"]);
        assert_eq!(observer.retries, vec![1, 2]);
        assert_eq!(
            observer.finished,
            vec![StepStatus::Failed, StepStatus::Succeeded]
        );
    }
}
