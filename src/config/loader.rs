//! Plan file discovery and loading.

use crate::config::schema::Plan;
use crate::error::{HostprepError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Default plan file name, looked up in the current directory.
pub const DEFAULT_PLAN_FILE: &str = "hostprep.yml";

/// Resolve the plan path from an optional CLI override.
pub fn resolve_plan_path(override_path: Option<&Path>) -> PathBuf {
    override_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_PLAN_FILE))
}

/// Directory that relative probe paths and actions resolve against.
///
/// This is the plan file's parent directory, so a plan can ship marker
/// files and scripts next to itself and reference them relatively.
pub fn plan_root(plan_path: &Path) -> PathBuf {
    match plan_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// Load and parse a plan file.
///
/// # Errors
///
/// Returns `PlanNotFound` if the file doesn't exist.
/// Returns `PlanParseError` if the YAML is invalid.
pub fn load_plan(path: &Path) -> Result<Plan> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            HostprepError::PlanNotFound {
                path: path.to_path_buf(),
            }
        } else {
            HostprepError::Io(e)
        }
    })?;

    parse_plan(&content, path)
}

/// Parse YAML content into a [`Plan`].
///
/// # Arguments
///
/// * `content` - The YAML content to parse
/// * `source_path` - Path for error reporting
pub fn parse_plan(content: &str, source_path: &Path) -> Result<Plan> {
    serde_yaml::from_str(content).map_err(|e| HostprepError::PlanParseError {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}
