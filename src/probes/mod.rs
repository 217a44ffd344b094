//! Precondition and postcondition probes.
//!
//! Probes are the side-effect-free half of a provisioning step: a
//! precondition decides whether the step's effect is already in place,
//! a postcondition verifies the effect actually took hold after the
//! action ran. Both are declarative so a plan file can describe them.
//!
//! A probe returns a clean verdict ([`ProbeOutcome`]) whenever it can.
//! Only a probe that cannot decide at all (e.g. an invalid regex)
//! returns an error; the engine treats that as needs-action for
//! preconditions, never as satisfied.

pub mod binary;
pub mod network;
pub mod service;

use crate::error::{HostprepError, Result};
use crate::exec::run_check;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A declarative state check.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Probe {
    /// A file or directory exists.
    FileExists {
        /// Path to check (relative paths resolve against the plan root).
        path: String,
    },

    /// A binary is present on PATH or in one of the given alternate
    /// directories. Vendor installers are known to drop binaries in
    /// unexpected locations, so the search list is configurable.
    BinaryInstalled {
        /// Binary name (e.g. "node").
        name: String,
        /// Additional directories to search besides PATH.
        #[serde(default)]
        extra_dirs: Vec<PathBuf>,
    },

    /// A command exits with code 0.
    CommandSucceeds {
        /// Command to run.
        command: String,
    },

    /// A command's stdout matches a regular expression.
    OutputMatches {
        /// Command to run.
        command: String,
        /// Regex matched against the command's stdout.
        pattern: String,
    },

    /// A system service is active.
    ServiceActive {
        /// Service unit name.
        service: String,
    },

    /// Something is listening on a local TCP port.
    PortBound {
        /// Port on 127.0.0.1.
        port: u16,
    },

    /// An HTTP GET returns a 2xx status.
    HttpOk {
        /// URL to fetch.
        url: String,
    },

    /// All probes must be satisfied.
    All {
        /// Probes that must all be satisfied.
        probes: Vec<Probe>,
    },

    /// Any probe being satisfied is sufficient.
    Any {
        /// Probes where at least one must be satisfied.
        probes: Vec<Probe>,
    },
}

impl Probe {
    /// Short kind label for listings.
    pub fn kind(&self) -> &'static str {
        match self {
            Probe::FileExists { .. } => "file_exists",
            Probe::BinaryInstalled { .. } => "binary_installed",
            Probe::CommandSucceeds { .. } => "command_succeeds",
            Probe::OutputMatches { .. } => "output_matches",
            Probe::ServiceActive { .. } => "service_active",
            Probe::PortBound { .. } => "port_bound",
            Probe::HttpOk { .. } => "http_ok",
            Probe::All { .. } => "all",
            Probe::Any { .. } => "any",
        }
    }
}

/// Verdict of evaluating a probe.
///
/// The `description` field is user-visible: it appears in skip messages
/// (e.g., "Skipped (binary on PATH: node)") and in the run summary.
#[derive(Debug, Clone)]
pub struct ProbeOutcome {
    /// Whether the probed state is in place.
    pub satisfied: bool,

    /// Description of what was checked.
    pub description: String,

    /// Details about the verdict.
    pub details: Option<String>,
}

impl ProbeOutcome {
    /// Create a satisfied verdict.
    pub fn satisfied(description: impl Into<String>) -> Self {
        Self {
            satisfied: true,
            description: description.into(),
            details: None,
        }
    }

    /// Create an unsatisfied verdict.
    pub fn unsatisfied(description: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            satisfied: false,
            description: description.into(),
            details: Some(details.into()),
        }
    }

    /// Display-friendly description with common prefixes stripped.
    pub fn short_description(&self) -> &str {
        const PREFIXES: &[&str] = &[
            "File exists: ",
            "File missing: ",
            "Binary on PATH: ",
            "Binary missing: ",
            "Command succeeded: ",
            "Command failed: ",
            "Service active: ",
            "Port bound: ",
        ];
        for prefix in PREFIXES {
            if let Some(rest) = self.description.strip_prefix(prefix) {
                return rest;
            }
        }
        &self.description
    }
}

/// Evaluate a probe against the plan root.
pub fn evaluate(probe: &Probe, root: &Path) -> Result<ProbeOutcome> {
    match probe {
        Probe::FileExists { path } => Ok(check_file_exists(path, root)),
        Probe::BinaryInstalled { name, extra_dirs } => Ok(binary::check(name, extra_dirs)),
        Probe::CommandSucceeds { command } => Ok(check_command_succeeds(command, root)),
        Probe::OutputMatches { command, pattern } => check_output_matches(command, pattern, root),
        Probe::ServiceActive { service } => Ok(service::check_active(service)),
        Probe::PortBound { port } => Ok(network::check_port_bound(*port)),
        Probe::HttpOk { url } => network::check_http_ok(url),
        Probe::All { probes } => check_all(probes, root),
        Probe::Any { probes } => check_any(probes, root),
    }
}

fn check_file_exists(path: &str, root: &Path) -> ProbeOutcome {
    let full_path = if Path::new(path).is_absolute() {
        Path::new(path).to_path_buf()
    } else {
        root.join(path)
    };

    if full_path.exists() {
        ProbeOutcome::satisfied(format!("File exists: {}", path))
    } else {
        ProbeOutcome::unsatisfied(
            format!("File missing: {}", path),
            format!("Expected at: {}", full_path.display()),
        )
    }
}

fn check_command_succeeds(command: &str, root: &Path) -> ProbeOutcome {
    if run_check(command, Some(root)) {
        ProbeOutcome::satisfied(format!("Command succeeded: {}", truncate(command, 50)))
    } else {
        ProbeOutcome::unsatisfied(
            format!("Command failed: {}", truncate(command, 50)),
            "Exit code was non-zero".to_string(),
        )
    }
}

fn check_output_matches(command: &str, pattern: &str, root: &Path) -> Result<ProbeOutcome> {
    let re = regex::Regex::new(pattern).map_err(|e| HostprepError::ProbeError {
        probe: "output_matches".to_string(),
        message: format!("invalid pattern '{}': {}", pattern, e),
    })?;

    let result = crate::exec::run(
        command,
        &crate::exec::ExecOptions {
            cwd: Some(root.to_path_buf()),
            ..Default::default()
        },
    )?;

    if result.success && re.is_match(&result.stdout) {
        Ok(ProbeOutcome::satisfied(format!(
            "Output matches /{}/: {}",
            pattern,
            truncate(command, 40)
        )))
    } else if !result.success {
        Ok(ProbeOutcome::unsatisfied(
            format!("Command failed: {}", truncate(command, 50)),
            format!("Exit code {:?}", result.exit_code),
        ))
    } else {
        Ok(ProbeOutcome::unsatisfied(
            format!("Output did not match /{}/", pattern),
            truncate(result.stdout.trim(), 120),
        ))
    }
}

fn check_all(probes: &[Probe], root: &Path) -> Result<ProbeOutcome> {
    let results = probes
        .iter()
        .map(|p| evaluate(p, root))
        .collect::<Result<Vec<_>>>()?;

    if results.iter().all(|r| r.satisfied) {
        Ok(ProbeOutcome::satisfied(format!(
            "All {} checks passed",
            probes.len()
        )))
    } else {
        let failed: Vec<_> = results
            .iter()
            .filter(|r| !r.satisfied)
            .map(|r| r.description.clone())
            .collect();

        Ok(ProbeOutcome::unsatisfied(
            format!("{}/{} checks failed", failed.len(), probes.len()),
            failed.join("; "),
        ))
    }
}

fn check_any(probes: &[Probe], root: &Path) -> Result<ProbeOutcome> {
    let results = probes
        .iter()
        .map(|p| evaluate(p, root))
        .collect::<Result<Vec<_>>>()?;

    if let Some(passed) = results.iter().find(|r| r.satisfied) {
        Ok(ProbeOutcome::satisfied(format!(
            "Check passed: {}",
            passed.description
        )))
    } else {
        Ok(ProbeOutcome::unsatisfied(
            format!("None of {} checks passed", probes.len()),
            results
                .iter()
                .map(|r| r.description.clone())
                .collect::<Vec<_>>()
                .join("; "),
        ))
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    // Commands and captured stdout may contain multi-byte text; the cut
    // must land on a char boundary.
    let mut cut = max_len.saturating_sub(3);
    while cut > 0 && !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}...", &s[..cut])
}
