//! Hostprep CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use hostprep::cli::{Cli, CommandDispatcher};
use hostprep::config;
use hostprep::ui::{Console, OutputMode, TerminalConsole};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber for logging.
///
/// Log level is controlled by:
/// 1. `--debug` flag sets level to DEBUG
/// 2. `RUST_LOG` environment variable (if set)
/// 3. Default is INFO
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("hostprep=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hostprep=info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    tracing::debug!("hostprep starting with args: {:?}", cli);

    let output_mode = if cli.quiet {
        OutputMode::Quiet
    } else if cli.verbose {
        OutputMode::Verbose
    } else {
        OutputMode::Normal
    };

    if cli.no_color {
        std::env::set_var("NO_COLOR", "1");
        console::set_colors_enabled(false);
    }

    let plan_path = config::resolve_plan_path(cli.plan.as_deref());

    let mut out = TerminalConsole::new(output_mode);
    let dispatcher = CommandDispatcher::new(plan_path);

    match dispatcher.dispatch(&cli, &mut out) {
        Ok(result) => ExitCode::from(result.exit_code as u8),
        Err(e) => {
            out.error(&format!("Error: {}", e));
            ExitCode::from(1)
        }
    }
}
