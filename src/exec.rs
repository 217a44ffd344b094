//! Shell command execution for actions and command-based probes.

use crate::error::{HostprepError, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// Result of executing a shell command.
#[derive(Debug, Clone)]
pub struct ExecResult {
    /// Exit code (None if killed by signal).
    pub exit_code: Option<i32>,

    /// Standard output.
    pub stdout: String,

    /// Standard error.
    pub stderr: String,

    /// Execution duration.
    pub duration: Duration,

    /// Whether the command succeeded (exit code 0).
    pub success: bool,
}

/// Options for command execution.
#[derive(Debug, Clone, Default)]
pub struct ExecOptions {
    /// Working directory.
    pub cwd: Option<PathBuf>,

    /// Environment variables (merged with the system environment).
    pub env: HashMap<String, String>,
}

fn shell() -> (&'static str, &'static str) {
    if cfg!(windows) {
        ("cmd", "/C")
    } else {
        ("sh", "-c")
    }
}

/// Execute a shell command, capturing its output.
pub fn run(command: &str, options: &ExecOptions) -> Result<ExecResult> {
    let start = Instant::now();
    let (sh, flag) = shell();

    let mut cmd = Command::new(sh);
    cmd.arg(flag);
    cmd.arg(command);
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    if let Some(cwd) = &options.cwd {
        cmd.current_dir(cwd);
    }
    for (key, value) in &options.env {
        cmd.env(key, value);
    }

    let output = cmd.output().map_err(|_| HostprepError::CommandFailed {
        command: command.to_string(),
        code: None,
    })?;

    Ok(ExecResult {
        exit_code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        duration: start.elapsed(),
        success: output.status.success(),
    })
}

/// Execute a command and return only whether it succeeded.
///
/// Used by probes, where the verdict is the exit code and spawn failures
/// count as an unsatisfied check rather than an error.
pub fn run_check(command: &str, cwd: Option<&Path>) -> bool {
    let options = ExecOptions {
        cwd: cwd.map(|p| p.to_path_buf()),
        ..Default::default()
    };

    run(command, &options).map(|r| r.success).unwrap_or(false)
}

/// Last non-empty line of a command's stderr, for error reporting.
pub fn stderr_tail(result: &ExecResult) -> Option<String> {
    result
        .stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn run_captures_stdout() {
        let result = run("echo hello", &ExecOptions::default()).unwrap();
        assert!(result.success);
        assert_eq!(result.exit_code, Some(0));
        assert!(result.stdout.contains("hello"));
    }

    #[test]
    fn run_reports_failure_exit_code() {
        let result = run("exit 3", &ExecOptions::default()).unwrap();
        assert!(!result.success);
        assert_eq!(result.exit_code, Some(3));
    }

    #[test]
    fn run_respects_cwd() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("marker.txt"), "").unwrap();

        let options = ExecOptions {
            cwd: Some(temp.path().to_path_buf()),
            ..Default::default()
        };
        let result = run(
            if cfg!(windows) {
                "if exist marker.txt (exit 0) else (exit 1)"
            } else {
                "test -f marker.txt"
            },
            &options,
        )
        .unwrap();
        assert!(result.success);
    }

    #[test]
    fn run_merges_env() {
        let mut env = HashMap::new();
        env.insert("HOSTPREP_TEST_VAR".to_string(), "probe".to_string());
        let options = ExecOptions {
            env,
            ..Default::default()
        };

        let result = run(
            if cfg!(windows) {
                "echo %HOSTPREP_TEST_VAR%"
            } else {
                "echo $HOSTPREP_TEST_VAR"
            },
            &options,
        )
        .unwrap();
        assert!(result.stdout.contains("probe"));
    }

    #[test]
    fn run_check_true_on_success() {
        assert!(run_check("exit 0", None));
        assert!(!run_check("exit 1", None));
    }

    #[test]
    fn stderr_tail_returns_last_nonempty_line() {
        let result = run("echo first >&2; echo last >&2", &ExecOptions::default()).unwrap();
        assert_eq!(stderr_tail(&result).as_deref(), Some("last"));
    }

    #[test]
    fn stderr_tail_none_when_silent() {
        let result = run("exit 0", &ExecOptions::default()).unwrap();
        assert!(stderr_tail(&result).is_none());
    }
}
