//! Console output.
//!
//! Commands write through the [`Console`] trait so tests can capture
//! output with [`MockConsole`](super::MockConsole) instead of asserting
//! on stdout.

use super::theme::HostprepTheme;

/// How much output to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Warnings and errors only.
    Quiet,
    /// Standard output.
    #[default]
    Normal,
    /// Include verbose detail.
    Verbose,
}

/// Output sink for commands.
pub trait Console {
    /// Print a plain message.
    fn message(&mut self, msg: &str);

    /// Print a message only in verbose mode.
    fn verbose(&mut self, msg: &str);

    /// Print a success message.
    fn success(&mut self, msg: &str);

    /// Print a skipped message.
    fn skipped(&mut self, msg: &str);

    /// Print a warning message.
    fn warning(&mut self, msg: &str);

    /// Print an error message (always shown, goes to stderr).
    fn error(&mut self, msg: &str);

    /// Print a section header.
    fn header(&mut self, title: &str);

    /// Current output mode.
    fn mode(&self) -> OutputMode;

    /// Whether output is suppressed to warnings and errors.
    fn is_quiet(&self) -> bool {
        self.mode() == OutputMode::Quiet
    }
}

/// Console writing styled output to stdout/stderr.
pub struct TerminalConsole {
    mode: OutputMode,
    theme: HostprepTheme,
}

impl TerminalConsole {
    /// Create a console for the given output mode.
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            theme: HostprepTheme::new(),
        }
    }

    /// Access the theme, e.g. for ad-hoc styling.
    pub fn theme(&self) -> &HostprepTheme {
        &self.theme
    }
}

impl Console for TerminalConsole {
    fn message(&mut self, msg: &str) {
        if self.mode != OutputMode::Quiet {
            println!("{}", msg);
        }
    }

    fn verbose(&mut self, msg: &str) {
        if self.mode == OutputMode::Verbose {
            println!("{}", self.theme.dim.apply_to(msg));
        }
    }

    fn success(&mut self, msg: &str) {
        if self.mode != OutputMode::Quiet {
            println!("{}", self.theme.format_success(msg));
        }
    }

    fn skipped(&mut self, msg: &str) {
        if self.mode != OutputMode::Quiet {
            println!("{}", self.theme.format_skipped(msg));
        }
    }

    fn warning(&mut self, msg: &str) {
        eprintln!("{}", self.theme.format_warning(msg));
    }

    fn error(&mut self, msg: &str) {
        eprintln!("{}", self.theme.format_error(msg));
    }

    fn header(&mut self, title: &str) {
        if self.mode != OutputMode::Quiet {
            println!();
            println!("{}", self.theme.format_header(title));
        }
    }

    fn mode(&self) -> OutputMode {
        self.mode
    }
}
