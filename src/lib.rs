//! Hostprep - idempotent provisioning step runner for bare-metal hosts.
//!
//! Hostprep replaces ad-hoc provisioning shell scripts with a declarative
//! YAML plan and a step engine that follows a single contract for every
//! step: detect state, act, verify, retry on transient failure.
//!
//! # Modules
//!
//! - [`actions`] - Effectful step actions (commands, package installs, services)
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Plan loading, parsing, and validation
//! - [`error`] - Error types and result aliases
//! - [`exec`] - Shell command execution
//! - [`probes`] - Precondition and postcondition probes
//! - [`runner`] - Step execution engine, retry policies, and run reports
//! - [`ui`] - Spinners, theming, and report rendering
//!
//! # Example
//!
//! ```
//! use hostprep::config::{Plan, Step};
//! use hostprep::actions::Action;
//! use hostprep::runner::{RunOptions, StepRunner};
//!
//! let plan = Plan {
//!     plan_name: "demo".to_string(),
//!     settings: Default::default(),
//!     steps: vec![Step {
//!         name: "hello".to_string(),
//!         action: Action::Command { command: "echo hello".to_string() },
//!         ..Default::default()
//!     }],
//! };
//!
//! let runner = StepRunner::new(&plan, std::env::temp_dir());
//! let report = runner.run(&RunOptions::default()).unwrap();
//! assert!(report.success());
//! ```

pub mod actions;
pub mod cli;
pub mod config;
pub mod error;
pub mod exec;
pub mod probes;
pub mod runner;
pub mod ui;

pub use error::{HostprepError, Result};
