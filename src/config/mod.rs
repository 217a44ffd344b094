//! Plan loading, parsing, and validation.

pub mod loader;
pub mod schema;
pub mod validator;

pub use loader::{load_plan, parse_plan, plan_root, resolve_plan_path, DEFAULT_PLAN_FILE};
pub use schema::{Backoff, FailurePolicy, Plan, RetryPolicy, Settings, Step};
pub use validator::{validate, validate_plan, ValidationError};
