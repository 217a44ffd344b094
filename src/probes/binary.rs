//! Binary presence probe.
//!
//! Vendor installers do not reliably leave their binary on PATH: some drop
//! it under `~/.local/bin`, `/usr/local/bin`, or an install-specific
//! directory, then exit 0. The probe therefore scans PATH plus a
//! caller-supplied list of alternate directories before concluding the
//! binary is missing.

use super::ProbeOutcome;
use std::path::{Path, PathBuf};

/// Check whether a file has executable permission bits set.
#[cfg(unix)]
pub fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

/// On Windows, executability is determined by file extension, not permission bits.
#[cfg(not(unix))]
pub fn is_executable(_path: &Path) -> bool {
    true
}

/// Parse the system PATH environment variable into a list of directories.
pub fn parse_system_path() -> Vec<PathBuf> {
    std::env::var_os("PATH")
        .map(|path| std::env::split_paths(&path).collect())
        .unwrap_or_default()
}

/// Resolve a binary by iterating over candidate directories.
///
/// Returns the first match that exists and is executable. Does NOT shell
/// out to `which` — `which` behavior varies across systems and is
/// sometimes a shell builtin with inconsistent error handling.
pub fn resolve(name: &str, dirs: &[PathBuf]) -> Option<PathBuf> {
    for dir in dirs {
        let candidate = dir.join(name);
        if candidate.is_file() && is_executable(&candidate) {
            return Some(candidate);
        }
    }
    None
}

/// Probe for a binary on PATH or in the given alternate directories.
pub fn check(name: &str, extra_dirs: &[PathBuf]) -> ProbeOutcome {
    let mut dirs = parse_system_path();
    dirs.extend(extra_dirs.iter().cloned());

    match resolve(name, &dirs) {
        Some(found) => {
            let mut outcome = ProbeOutcome::satisfied(format!("Binary on PATH: {}", name));
            outcome.details = Some(format!("Found at: {}", found.display()));
            outcome
        }
        None => ProbeOutcome::unsatisfied(
            format!("Binary missing: {}", name),
            format!("Searched {} directories", dirs.len()),
        ),
    }
}
