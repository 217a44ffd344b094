//! Terminal output: theming, spinners, and report rendering.

pub mod mock;
pub mod output;
pub mod spinner;
pub mod summary;
pub mod theme;

pub use mock::MockConsole;
pub use output::{Console, OutputMode, TerminalConsole};
pub use spinner::StepSpinner;
pub use theme::HostprepTheme;
