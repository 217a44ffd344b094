//! Mock console implementation for testing.
//!
//! `MockConsole` implements the [`Console`] trait and captures all
//! output for later assertion.
//!
//! # Example
//!
//! ```
//! use hostprep::ui::{Console, MockConsole};
//!
//! let mut out = MockConsole::new();
//! out.message("Starting run");
//! out.success("Done!");
//!
//! assert!(out.messages().contains(&"Starting run".to_string()));
//! assert!(out.successes().contains(&"Done!".to_string()));
//! ```

use super::output::{Console, OutputMode};

/// Mock console capturing all output for assertions.
#[derive(Debug, Default)]
pub struct MockConsole {
    mode: OutputMode,
    messages: Vec<String>,
    verbose: Vec<String>,
    successes: Vec<String>,
    skips: Vec<String>,
    warnings: Vec<String>,
    errors: Vec<String>,
    headers: Vec<String>,
}

impl MockConsole {
    /// Create a new MockConsole with Normal output mode.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new MockConsole with a specific output mode.
    pub fn with_mode(mode: OutputMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    /// Captured plain messages.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Captured success messages.
    pub fn successes(&self) -> &[String] {
        &self.successes
    }

    /// Captured skipped messages.
    pub fn skips(&self) -> &[String] {
        &self.skips
    }

    /// Captured warnings.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Captured errors.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Captured headers.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// All captured output, in call order within each kind.
    pub fn all_output(&self) -> String {
        let mut all = Vec::new();
        all.extend(self.headers.iter().cloned());
        all.extend(self.messages.iter().cloned());
        all.extend(self.verbose.iter().cloned());
        all.extend(self.successes.iter().cloned());
        all.extend(self.skips.iter().cloned());
        all.extend(self.warnings.iter().cloned());
        all.extend(self.errors.iter().cloned());
        all.join("\n")
    }
}

impl Console for MockConsole {
    fn message(&mut self, msg: &str) {
        self.messages.push(msg.to_string());
    }

    fn verbose(&mut self, msg: &str) {
        self.verbose.push(msg.to_string());
    }

    fn success(&mut self, msg: &str) {
        self.successes.push(msg.to_string());
    }

    fn skipped(&mut self, msg: &str) {
        self.skips.push(msg.to_string());
    }

    fn warning(&mut self, msg: &str) {
        self.warnings.push(msg.to_string());
    }

    fn error(&mut self, msg: &str) {
        self.errors.push(msg.to_string());
    }

    fn header(&mut self, title: &str) {
        self.headers.push(title.to_string());
    }

    fn mode(&self) -> OutputMode {
        self.mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_each_output_kind() {
        let mut out = MockConsole::new();
        out.header("Run");
        out.message("working");
        out.success("ok");
        out.skipped("already there");
        out.warning("careful");
        out.error("broke");

        assert_eq!(out.headers(), ["Run"]);
        assert_eq!(out.messages(), ["working"]);
        assert_eq!(out.successes(), ["ok"]);
        assert_eq!(out.skips(), ["already there"]);
        assert_eq!(out.warnings(), ["careful"]);
        assert_eq!(out.errors(), ["broke"]);
    }

    #[test]
    fn all_output_joins_everything() {
        let mut out = MockConsole::new();
        out.message("one");
        out.error("two");
        let all = out.all_output();
        assert!(all.contains("one"));
        assert!(all.contains("two"));
    }

    #[test]
    fn with_mode_sets_mode() {
        let out = MockConsole::with_mode(OutputMode::Quiet);
        assert!(out.is_quiet());
    }
}
