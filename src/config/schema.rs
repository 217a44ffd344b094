//! Plan schema definitions.
//!
//! This module contains the struct definitions that map to the YAML
//! plan file format. A plan is an ordered list of steps; list position
//! is execution order.

use crate::actions::Action;
use crate::probes::Probe;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Root structure for hostprep.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    /// Plan name (for display purposes)
    pub plan_name: String,

    /// Global settings
    #[serde(default)]
    pub settings: Settings,

    /// Ordered step definitions. The list order is the execution order.
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Plan {
    /// Look up a step by name.
    pub fn step(&self, name: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.name == name)
    }

    /// Names of all steps in declaration order.
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name.as_str()).collect()
    }
}

/// Global settings that apply to every step.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Environment variables exported to every action.
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,
}

/// A single provisioning step.
///
/// The precondition decides whether the step's effect is already in
/// place; the action applies it; the postcondition verifies it took
/// hold independent of the action's own exit status. The retry policy
/// wraps action + postcondition only, never the precondition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    /// Unique step name (used in logs and the run report).
    pub name: String,

    /// Optional human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Precondition probe. When satisfied, the step is skipped without
    /// invoking the action. A step without a precondition always runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precondition: Option<Probe>,

    /// The effectful operation.
    pub action: Action,

    /// Postcondition probe run after the action. An attempt counts as
    /// successful only if the action reports success AND this holds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postcondition: Option<Probe>,

    /// Retry policy around action + postcondition.
    #[serde(default)]
    pub retry: RetryPolicy,

    /// What to do when retries are exhausted.
    #[serde(default)]
    pub on_failure: FailurePolicy,

    /// Step-specific environment variables (override global settings).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,
}

impl Default for Step {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: None,
            precondition: None,
            action: Action::Command {
                command: String::new(),
            },
            postcondition: None,
            retry: RetryPolicy::default(),
            on_failure: FailurePolicy::default(),
            env: HashMap::new(),
        }
    }
}

/// Retry policy for a step's action + postcondition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Minimum 1.
    pub max_attempts: u32,

    /// Delay between attempts.
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            backoff: Backoff::None,
        }
    }
}

/// Delay strategy between retry attempts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Backoff {
    /// Retry immediately.
    None,

    /// Fixed delay between attempts.
    Constant {
        /// Delay in seconds.
        seconds: f64,
    },

    /// Delay doubles after each failed attempt, capped at `max_seconds`.
    /// Suited to network-dependent actions such as waiting for a freshly
    /// started service to answer health checks.
    Exponential {
        /// Delay after the first failed attempt, in seconds.
        initial_seconds: f64,
        /// Upper bound on the delay, in seconds.
        max_seconds: f64,
    },
}

impl Backoff {
    /// Delay to sleep after the given failed attempt (1-based).
    pub fn delay_after(&self, failed_attempt: u32) -> Duration {
        match self {
            Backoff::None => Duration::ZERO,
            Backoff::Constant { seconds } => Duration::from_secs_f64(seconds.max(0.0)),
            Backoff::Exponential {
                initial_seconds,
                max_seconds,
            } => {
                // Cap the exponent so the multiplication cannot overflow to inf.
                let exp = failed_attempt.saturating_sub(1).min(32);
                let delay = initial_seconds.max(0.0) * 2f64.powi(exp as i32);
                Duration::from_secs_f64(delay.min(max_seconds.max(0.0)))
            }
        }
    }
}

/// What an exhausted step does to the rest of the run.
///
/// Steps installing strictly-required tooling abort; optional,
/// best-effort steps (one model download among several) continue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop the run. Remaining steps are recorded as not attempted.
    #[default]
    Abort,

    /// Record the failure and proceed to the next step.
    Continue,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_policy_defaults_to_single_attempt() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.backoff, Backoff::None);
    }

    #[test]
    fn failure_policy_defaults_to_abort() {
        assert_eq!(FailurePolicy::default(), FailurePolicy::Abort);
    }

    #[test]
    fn backoff_none_has_zero_delay() {
        assert_eq!(Backoff::None.delay_after(1), Duration::ZERO);
        assert_eq!(Backoff::None.delay_after(10), Duration::ZERO);
    }

    #[test]
    fn backoff_constant_is_flat() {
        let backoff = Backoff::Constant { seconds: 2.5 };
        assert_eq!(backoff.delay_after(1), Duration::from_secs_f64(2.5));
        assert_eq!(backoff.delay_after(5), Duration::from_secs_f64(2.5));
    }

    #[test]
    fn backoff_exponential_doubles_until_cap() {
        let backoff = Backoff::Exponential {
            initial_seconds: 1.0,
            max_seconds: 5.0,
        };
        assert_eq!(backoff.delay_after(1), Duration::from_secs_f64(1.0));
        assert_eq!(backoff.delay_after(2), Duration::from_secs_f64(2.0));
        assert_eq!(backoff.delay_after(3), Duration::from_secs_f64(4.0));
        // Capped at max_seconds from here on.
        assert_eq!(backoff.delay_after(4), Duration::from_secs_f64(5.0));
        assert_eq!(backoff.delay_after(30), Duration::from_secs_f64(5.0));
    }

    #[test]
    fn backoff_exponential_survives_large_attempt_counts() {
        let backoff = Backoff::Exponential {
            initial_seconds: 1.0,
            max_seconds: 60.0,
        };
        assert_eq!(backoff.delay_after(u32::MAX), Duration::from_secs_f64(60.0));
    }

    #[test]
    fn plan_finds_step_by_name() {
        let plan = Plan {
            plan_name: "test".to_string(),
            settings: Settings::default(),
            steps: vec![
                Step {
                    name: "first".to_string(),
                    ..Default::default()
                },
                Step {
                    name: "second".to_string(),
                    ..Default::default()
                },
            ],
        };

        assert!(plan.step("second").is_some());
        assert!(plan.step("third").is_none());
        assert_eq!(plan.step_names(), vec!["first", "second"]);
    }

    #[test]
    fn step_deserializes_with_defaults() {
        let step: Step = serde_yaml::from_str(
            r#"
            name: install_node
            action:
              type: command
              command: apt-get install -y nodejs
        "#,
        )
        .unwrap();

        assert_eq!(step.name, "install_node");
        assert!(step.precondition.is_none());
        assert!(step.postcondition.is_none());
        assert_eq!(step.retry.max_attempts, 1);
        assert_eq!(step.on_failure, FailurePolicy::Abort);
    }

    #[test]
    fn step_deserializes_full_shape() {
        let step: Step = serde_yaml::from_str(
            r#"
            name: ollama
            description: Install the model runtime
            precondition:
              type: binary_installed
              name: ollama
              extra_dirs: ["/usr/local/bin"]
            action:
              type: run_installer
              url: https://example.com/install.sh
            postcondition:
              type: http_ok
              url: http://127.0.0.1:11434/api/version
            retry:
              max_attempts: 5
              backoff:
                type: exponential
                initial_seconds: 1
                max_seconds: 30
            on_failure: continue
        "#,
        )
        .unwrap();

        assert_eq!(step.retry.max_attempts, 5);
        assert_eq!(step.on_failure, FailurePolicy::Continue);
        assert!(matches!(
            step.retry.backoff,
            Backoff::Exponential { .. }
        ));
    }

    #[test]
    fn plan_deserializes_with_settings_env() {
        let plan: Plan = serde_yaml::from_str(
            r#"
            plan_name: ai-host
            settings:
              env:
                DEBIAN_FRONTEND: noninteractive
            steps:
              - name: packages
                action:
                  type: install_packages
                  packages: [ffmpeg, libgl1]
        "#,
        )
        .unwrap();

        assert_eq!(plan.plan_name, "ai-host");
        assert_eq!(
            plan.settings.env.get("DEBIAN_FRONTEND").map(String::as_str),
            Some("noninteractive")
        );
        assert_eq!(plan.steps.len(), 1);
    }

    #[test]
    fn plan_round_trips_through_yaml() {
        let plan = Plan {
            plan_name: "round-trip".to_string(),
            settings: Settings::default(),
            steps: vec![Step {
                name: "one".to_string(),
                action: Action::Command {
                    command: "true".to_string(),
                },
                on_failure: FailurePolicy::Continue,
                ..Default::default()
            }],
        };

        let yaml = serde_yaml::to_string(&plan).unwrap();
        let parsed: Plan = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.plan_name, "round-trip");
        assert_eq!(parsed.steps[0].on_failure, FailurePolicy::Continue);
    }
}
