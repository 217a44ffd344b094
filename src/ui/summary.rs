//! Run report rendering.

use crate::error::Result;
use crate::runner::{format_duration, RunReport, StepStatus};

use super::output::Console;

/// Render the human-readable run summary.
pub fn render_summary(report: &RunReport, out: &mut dyn Console) {
    out.header(&format!("Run summary — {}", report.plan_name));

    for record in &report.records {
        match record.status {
            StepStatus::Succeeded => out.success(&strip_glyph(&record.summary_line())),
            StepStatus::Skipped => out.skipped(&strip_glyph(&record.summary_line())),
            StepStatus::Failed => out.error(&strip_glyph(&record.summary_line())),
            StepStatus::NotAttempted => out.message(&record.summary_line()),
        }
    }

    out.message("");
    out.message(&format!(
        "{} succeeded, {} skipped, {} failed, {} not attempted ({})",
        report.count(StepStatus::Succeeded),
        report.count(StepStatus::Skipped),
        report.count(StepStatus::Failed),
        report.count(StepStatus::NotAttempted),
        format_duration(report.total_duration()),
    ));

    let failed = report.failed_steps();
    if !failed.is_empty() {
        out.message("");
        for record in &failed {
            out.error(&format!(
                "{} failed after {} attempt(s): {}",
                record.name,
                record.attempts,
                record.detail.as_deref().unwrap_or("unknown error")
            ));
        }
        out.message("Re-run the plan to retry; steps already in place will be skipped.");
    }
}

/// Render the report as pretty-printed JSON.
pub fn render_json(report: &RunReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(|e| crate::error::HostprepError::Other(e.into()))
}

// Console methods add their own status glyph.
fn strip_glyph(line: &str) -> String {
    line.chars().skip(2).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::StepRecord;
    use crate::ui::MockConsole;
    use std::time::Duration;

    fn sample_report() -> RunReport {
        let mut report = RunReport::new("sample");
        report.push(StepRecord::succeeded("install", 1, Duration::from_secs(2)));
        report.push(StepRecord::skipped("node", "Binary on PATH: node"));
        report.push(StepRecord::failed("model", 3, Duration::ZERO, "HTTP 500"));
        report.push(StepRecord::not_attempted("shortcut", "not selected"));
        report
    }

    #[test]
    fn summary_names_every_step() {
        let mut out = MockConsole::new();
        render_summary(&sample_report(), &mut out);

        let all = out.all_output();
        for name in ["install", "node", "model", "shortcut"] {
            assert!(all.contains(name), "missing {} in: {}", name, all);
        }
    }

    #[test]
    fn summary_counts_statuses() {
        let mut out = MockConsole::new();
        render_summary(&sample_report(), &mut out);

        assert!(out
            .all_output()
            .contains("1 succeeded, 1 skipped, 1 failed, 1 not attempted"));
    }

    #[test]
    fn summary_names_failed_step_and_last_error() {
        let mut out = MockConsole::new();
        render_summary(&sample_report(), &mut out);

        let errors = out.errors().join("\n");
        assert!(errors.contains("model"));
        assert!(errors.contains("HTTP 500"));
    }

    #[test]
    fn clean_report_has_no_failure_block() {
        let mut report = RunReport::new("clean");
        report.push(StepRecord::succeeded("a", 1, Duration::ZERO));

        let mut out = MockConsole::new();
        render_summary(&report, &mut out);
        assert!(out.errors().is_empty());
    }

    #[test]
    fn json_is_machine_readable() {
        let json = render_json(&sample_report()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["plan_name"], "sample");
        assert_eq!(value["records"].as_array().unwrap().len(), 4);
    }
}
