//! Step actions: the effectful half of a provisioning step.
//!
//! Actions may be slow (package installs, model downloads) and may not be
//! idempotent at the OS level. Safety comes from the step's precondition,
//! not from the action itself, and success is confirmed by the step's
//! postcondition rather than trusted from the action's exit status.

use crate::error::{HostprepError, Result};
use crate::exec::{run, ExecOptions, ExecResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

/// Package manager invocation used when a step does not name its own.
const DEFAULT_PACKAGE_MANAGER: &str = "apt-get install -y";

static INSTALLER_COUNTER: AtomicU64 = AtomicU64::new(1);

/// A declarative effect.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Arbitrary shell command.
    Command {
        /// Command to execute.
        command: String,
    },

    /// Install a set of OS packages via the package manager.
    InstallPackages {
        /// Package names.
        packages: Vec<String>,
        /// Install command prefix (defaults to `apt-get install -y`).
        #[serde(default)]
        manager: Option<String>,
    },

    /// Fetch a vendor installer script over HTTP and execute it with the
    /// shell, the way the vendor's own `curl | sh` instructions would.
    RunInstaller {
        /// URL of the installer script.
        url: String,
    },

    /// Start a system service.
    StartService {
        /// Service unit name.
        service: String,
    },
}

impl Action {
    /// Short kind label for listings.
    pub fn kind(&self) -> &'static str {
        match self {
            Action::Command { .. } => "command",
            Action::InstallPackages { .. } => "install_packages",
            Action::RunInstaller { .. } => "run_installer",
            Action::StartService { .. } => "start_service",
        }
    }

    /// One-line description for dry runs and listings.
    pub fn summary(&self) -> String {
        match self {
            Action::Command { command } => command.clone(),
            Action::InstallPackages { packages, manager } => format!(
                "{} {}",
                manager.as_deref().unwrap_or(DEFAULT_PACKAGE_MANAGER),
                packages.join(" ")
            ),
            Action::RunInstaller { url } => format!("fetch and run installer: {}", url),
            Action::StartService { service } => format!("systemctl start {}", service),
        }
    }
}

/// Execute an action in the plan root with the given environment.
pub fn run_action(
    action: &Action,
    root: &Path,
    env: &HashMap<String, String>,
) -> Result<ExecResult> {
    let options = ExecOptions {
        cwd: Some(root.to_path_buf()),
        env: env.clone(),
    };

    match action {
        Action::Command { command } => run(command, &options),
        Action::InstallPackages { packages, manager } => {
            let command = format!(
                "{} {}",
                manager.as_deref().unwrap_or(DEFAULT_PACKAGE_MANAGER),
                packages.join(" ")
            );
            run(&command, &options)
        }
        Action::RunInstaller { url } => run_installer(url, &options),
        Action::StartService { service } => {
            let command = format!(
                "systemctl start {}",
                crate::probes::service::shell_quote(service)
            );
            run(&command, &options)
        }
    }
}

/// Download an installer script to a temp file and execute it.
///
/// The script runs through the shell so vendor scripts that re-exec
/// themselves or source shell helpers behave as documented. The temp file
/// is removed afterwards regardless of the script's exit status.
fn run_installer(url: &str, options: &ExecOptions) -> Result<ExecResult> {
    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(120))
        .build()
        .map_err(|e| HostprepError::InstallerFetchFailed {
            url: url.to_string(),
            message: e.to_string(),
        })?;

    let script = client
        .get(url)
        .send()
        .and_then(|r| r.error_for_status())
        .and_then(|r| r.text())
        .map_err(|e| HostprepError::InstallerFetchFailed {
            url: url.to_string(),
            message: e.to_string(),
        })?;

    let seq = INSTALLER_COUNTER.fetch_add(1, Ordering::Relaxed);
    let script_path = std::env::temp_dir().join(format!(
        "hostprep-installer-{}-{}.sh",
        std::process::id(),
        seq
    ));
    std::fs::write(&script_path, script)?;

    let result = run(&format!("sh {}", script_path.display()), options);
    let _ = std::fs::remove_file(&script_path);
    result
}
