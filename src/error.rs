//! Error types for hostprep operations.
//!
//! This module defines [`HostprepError`], the primary error type used
//! throughout the application, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Use `HostprepError` for domain-specific errors that need distinct handling
//! - Use `anyhow::Error` (via `HostprepError::Other`) for unexpected errors
//! - Action and postcondition failures are retryable: the step engine contains
//!   them inside the attempt loop and they never surface past a step boundary
//!   except as the step's final `Failed` status

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for hostprep operations.
#[derive(Debug, Error)]
pub enum HostprepError {
    /// Plan file not found at expected location.
    #[error("Plan not found: {path}")]
    PlanNotFound { path: PathBuf },

    /// Failed to parse plan file.
    #[error("Failed to parse plan at {path}: {message}")]
    PlanParseError { path: PathBuf, message: String },

    /// Invalid plan structure or values.
    #[error("Invalid plan: {message}")]
    PlanValidationError { message: String },

    /// A step name given on the command line does not exist in the plan.
    #[error("Unknown step: {name}")]
    UnknownStep { name: String },

    /// A probe could not produce a clean verdict (as opposed to a clean
    /// "unsatisfied"). The engine treats this as needs-action for
    /// preconditions and as a failed attempt for postconditions.
    #[error("Probe '{probe}' could not produce a verdict: {message}")]
    ProbeError { probe: String, message: String },

    /// A step's action failed.
    #[error("Action failed for step '{step}': {message}")]
    ActionFailed { step: String, message: String },

    /// A step's action reported success but verification failed.
    #[error("Step '{step}' ran but verification failed: {message}")]
    PostconditionFailed { step: String, message: String },

    /// A vendor installer script could not be downloaded.
    #[error("Installer download failed for {url}: {message}")]
    InstallerFetchFailed { url: String, message: String },

    /// Shell command could not be spawned.
    #[error("Command failed with exit code {code:?}: {command}")]
    CommandFailed { command: String, code: Option<i32> },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for hostprep operations.
pub type Result<T> = std::result::Result<T, HostprepError>;
