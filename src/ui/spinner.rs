//! Progress spinners.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use super::theme::HostprepTheme;

/// A progress spinner shown while a step's action runs.
pub struct StepSpinner {
    bar: ProgressBar,
}

impl StepSpinner {
    /// Create a new spinner with a message.
    pub fn new(message: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
                .template("{spinner:.cyan} {msg}")
                .unwrap(),
        );
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(80));

        Self { bar }
    }

    /// Create a spinner that doesn't show (for quiet or non-TTY runs).
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    /// Update the spinner message.
    pub fn set_message(&mut self, msg: &str) {
        self.bar.set_message(msg.to_string());
    }

    /// Replace the spinner with a success line.
    pub fn finish_success(self, msg: &str) {
        self.finish_with(HostprepTheme::new().format_success(msg));
    }

    /// Replace the spinner with an error line.
    pub fn finish_error(self, msg: &str) {
        self.finish_with(HostprepTheme::new().format_error(msg));
    }

    /// Replace the spinner with a skipped line.
    pub fn finish_skipped(self, msg: &str) {
        self.finish_with(HostprepTheme::new().format_skipped(msg));
    }

    /// Replace the spinner with a dim line.
    pub fn finish_dim(self, msg: &str) {
        let theme = HostprepTheme::new();
        self.finish_with(format!("{}", theme.dim.apply_to(msg)));
    }

    fn finish_with(self, line: String) {
        self.bar
            .set_style(ProgressStyle::default_spinner().template("{msg}").unwrap());
        self.bar.finish_with_message(line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spinner_creation() {
        let spinner = StepSpinner::new("Working...");
        drop(spinner);
    }

    #[test]
    fn hidden_spinner() {
        let spinner = StepSpinner::hidden();
        drop(spinner);
    }

    #[test]
    fn spinner_finish_success() {
        let spinner = StepSpinner::new("Working...");
        spinner.finish_success("Done");
    }

    #[test]
    fn spinner_finish_error() {
        let spinner = StepSpinner::new("Working...");
        spinner.finish_error("Failed");
    }

    #[test]
    fn spinner_set_message() {
        let mut spinner = StepSpinner::new("Initial");
        spinner.set_message("Updated");
        spinner.finish_skipped("Skipped");
    }
}
