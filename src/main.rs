//! pyprojkit - Python package descriptor toolkit
//!
//! Works on a project's pyproject.toml:
//! - show / check / fmt the descriptor
//! - resolve dependencies against PyPI or a local index file
//! - build wheel and sdist artifacts
//! - install console-script launchers

use clap::Parser;
use pyprojkit::cli::CliArgs;
use pyprojkit::orchestrator::Orchestrator;
use std::io::{self, Write};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();
    init_logging(&args);

    // Run the main logic and handle errors
    match run(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr; `--verbose`/`--quiet` override `RUST_LOG`
fn init_logging(args: &CliArgs) {
    let filter = if args.quiet {
        EnvFilter::new("error")
    } else if args.verbose {
        EnvFilter::new("pyprojkit=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Main application logic
async fn run(args: CliArgs) -> anyhow::Result<bool> {
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), command = ?args.command, "starting");

    let orchestrator = Orchestrator::new(args);

    let mut stdout = io::stdout().lock();
    let success = orchestrator.run(&mut stdout).await?;
    stdout.flush()?;

    Ok(success)
}
