//! Plan validation rules.
//!
//! This module validates a parsed plan for correctness:
//! - The plan must contain at least one step
//! - Step names must be non-empty and unique
//! - Retry policies must allow at least one attempt
//! - Command actions and probes must have non-empty commands

use crate::actions::Action;
use crate::config::schema::Plan;
use crate::error::{HostprepError, Result};
use crate::probes::Probe;
use std::collections::HashSet;

/// Validation error with context.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Rule identifier
    pub rule: String,
    /// Human-readable error message
    pub message: String,
    /// Step name if error is step-specific
    pub step: Option<String>,
}

/// Validate a plan and return all errors.
///
/// Collects all validation errors rather than stopping at the first
/// one, allowing users to fix multiple issues at once.
pub fn validate_plan(plan: &Plan) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if plan.steps.is_empty() {
        errors.push(ValidationError {
            rule: "empty-plan".to_string(),
            message: "Plan has no steps".to_string(),
            step: None,
        });
    }

    let mut seen = HashSet::new();
    for step in &plan.steps {
        if step.name.trim().is_empty() {
            errors.push(ValidationError {
                rule: "unnamed-step".to_string(),
                message: "Step has an empty name".to_string(),
                step: None,
            });
        } else if !seen.insert(step.name.clone()) {
            errors.push(ValidationError {
                rule: "duplicate-step".to_string(),
                message: format!("Duplicate step name '{}'", step.name),
                step: Some(step.name.clone()),
            });
        }

        if step.retry.max_attempts == 0 {
            errors.push(ValidationError {
                rule: "invalid-retry".to_string(),
                message: format!(
                    "Step '{}' has max_attempts = 0; at least one attempt is required",
                    step.name
                ),
                step: Some(step.name.clone()),
            });
        }

        errors.extend(validate_action(&step.name, &step.action));

        for probe in [&step.precondition, &step.postcondition]
            .into_iter()
            .flatten()
        {
            errors.extend(validate_probe(&step.name, probe));
        }
    }

    errors
}

fn validate_action(step: &str, action: &Action) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    match action {
        Action::Command { command } if command.trim().is_empty() => {
            errors.push(ValidationError {
                rule: "empty-command".to_string(),
                message: format!("Step '{}' has an empty command action", step),
                step: Some(step.to_string()),
            });
        }
        Action::InstallPackages { packages, .. } if packages.is_empty() => {
            errors.push(ValidationError {
                rule: "empty-packages".to_string(),
                message: format!("Step '{}' installs an empty package set", step),
                step: Some(step.to_string()),
            });
        }
        _ => {}
    }

    errors
}

fn validate_probe(step: &str, probe: &Probe) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    match probe {
        Probe::CommandSucceeds { command } | Probe::OutputMatches { command, .. }
            if command.trim().is_empty() =>
        {
            errors.push(ValidationError {
                rule: "empty-probe-command".to_string(),
                message: format!("Step '{}' has a probe with an empty command", step),
                step: Some(step.to_string()),
            });
        }
        Probe::All { probes } | Probe::Any { probes } => {
            if probes.is_empty() {
                errors.push(ValidationError {
                    rule: "empty-combinator".to_string(),
                    message: format!("Step '{}' has a combinator probe with no children", step),
                    step: Some(step.to_string()),
                });
            }
            for child in probes {
                errors.extend(validate_probe(step, child));
            }
        }
        _ => {}
    }

    errors
}

/// Validate and return Result (for convenience).
///
/// # Errors
///
/// Returns `PlanValidationError` if any validation rules fail.
pub fn validate(plan: &Plan) -> Result<()> {
    let errors = validate_plan(plan);

    if errors.is_empty() {
        Ok(())
    } else {
        let messages: Vec<_> = errors.iter().map(|e| e.message.clone()).collect();
        Err(HostprepError::PlanValidationError {
            message: messages.join("; "),
        })
    }
}
