//! Run reports.
//!
//! A [`RunReport`] is the ordered record of per-step outcomes for one
//! execution of a plan. It is created empty at run start, appended to
//! monotonically, and rendered once at run end; nothing is persisted.

use chrono::{DateTime, Local};
use serde::{Serialize, Serializer};
use std::time::Duration;

/// Final status of a step within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Precondition was already satisfied; the action never ran.
    Skipped,

    /// Action ran and the postcondition passed.
    Succeeded,

    /// Retries exhausted without a successful attempt.
    Failed,

    /// Never started: an earlier abort-policy step failed, the run was
    /// cancelled, or the step was not selected.
    NotAttempted,
}

impl StepStatus {
    /// Get a display character for this status.
    pub fn display_char(&self) -> char {
        match self {
            StepStatus::Skipped => '⊘',
            StepStatus::Succeeded => '✓',
            StepStatus::Failed => '✗',
            StepStatus::NotAttempted => '○',
        }
    }
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StepStatus::Skipped => "skipped",
            StepStatus::Succeeded => "succeeded",
            StepStatus::Failed => "failed",
            StepStatus::NotAttempted => "not attempted",
        };
        write!(f, "{}", s)
    }
}

/// Outcome of a single step.
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    /// Step name.
    pub name: String,

    /// Final status.
    pub status: StepStatus,

    /// Action attempts made (0 when skipped or not attempted).
    pub attempts: u32,

    /// Time spent on the step, including retries and backoff sleeps.
    #[serde(rename = "duration_ms", serialize_with = "duration_as_millis")]
    pub duration: Duration,

    /// Skip reason, dry-run preview, or the last error observed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl StepRecord {
    /// Create a skipped record (precondition already satisfied).
    pub fn skipped(name: &str, reason: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            status: StepStatus::Skipped,
            attempts: 0,
            duration: Duration::ZERO,
            detail: Some(reason.into()),
        }
    }

    /// Create a success record.
    pub fn succeeded(name: &str, attempts: u32, duration: Duration) -> Self {
        Self {
            name: name.to_string(),
            status: StepStatus::Succeeded,
            attempts,
            duration,
            detail: None,
        }
    }

    /// Create a failure record carrying the last error observed.
    pub fn failed(name: &str, attempts: u32, duration: Duration, error: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            status: StepStatus::Failed,
            attempts,
            duration,
            detail: Some(error.into()),
        }
    }

    /// Create a not-attempted record.
    pub fn not_attempted(name: &str, reason: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            status: StepStatus::NotAttempted,
            attempts: 0,
            duration: Duration::ZERO,
            detail: Some(reason.into()),
        }
    }

    /// Generate a summary line for display.
    pub fn summary_line(&self) -> String {
        let glyph = self.status.display_char();
        match self.status {
            StepStatus::Succeeded => {
                let retries = if self.attempts > 1 {
                    format!(", attempt {}", self.attempts)
                } else {
                    String::new()
                };
                format!(
                    "{} {} ({}{})",
                    glyph,
                    self.name,
                    format_duration(self.duration),
                    retries
                )
            }
            StepStatus::Skipped => {
                let reason = self.detail.as_deref().unwrap_or("already satisfied");
                format!("{} {} ({})", glyph, self.name, reason)
            }
            StepStatus::Failed => {
                let error = self.detail.as_deref().unwrap_or("unknown error");
                format!("{} {} - {}", glyph, self.name, error)
            }
            StepStatus::NotAttempted => {
                let reason = self.detail.as_deref().unwrap_or("not attempted");
                format!("{} {} ({})", glyph, self.name, reason)
            }
        }
    }
}

fn duration_as_millis<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u128(d.as_millis())
}

/// Ordered record of per-step outcomes for one plan execution.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Plan name.
    pub plan_name: String,

    /// When the run started.
    pub started_at: DateTime<Local>,

    /// Per-step records in declaration order. One entry per plan step.
    pub records: Vec<StepRecord>,
}

impl RunReport {
    /// Create an empty report for a run starting now.
    pub fn new(plan_name: &str) -> Self {
        Self {
            plan_name: plan_name.to_string(),
            started_at: Local::now(),
            records: Vec::new(),
        }
    }

    /// Append a step record.
    pub fn push(&mut self, record: StepRecord) {
        self.records.push(record);
    }

    /// Whether no step ended failed. Drives the process exit code.
    pub fn success(&self) -> bool {
        !self
            .records
            .iter()
            .any(|r| r.status == StepStatus::Failed)
    }

    /// Number of records with the given status.
    pub fn count(&self, status: StepStatus) -> usize {
        self.records.iter().filter(|r| r.status == status).count()
    }

    /// Records of steps that ended failed.
    pub fn failed_steps(&self) -> Vec<&StepRecord> {
        self.records
            .iter()
            .filter(|r| r.status == StepStatus::Failed)
            .collect()
    }

    /// Total time across all steps.
    pub fn total_duration(&self) -> Duration {
        self.records.iter().map(|r| r.duration).sum()
    }
}

/// Format a duration for display.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if secs == 0 {
        format!("{}ms", millis)
    } else if secs < 60 {
        format!("{}.{}s", secs, millis / 100)
    } else {
        let mins = secs / 60;
        let secs = secs % 60;
        format!("{}m {}s", mins, secs)
    }
}
