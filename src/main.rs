//! archrules: evaluate architecture rules against a compiled codebase.
//!
//! The `check` stage runs every registered rule against each source set and
//! persists the results. The report stages (`console-report`, `json-report`,
//! `enforce`) read the persisted results, so they can be re-run without
//! re-evaluating anything. `all` chains the stages the way a build gate does.

use std::process::ExitCode;

use archrules_core::app;
use archrules_core::cli::Cli;
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    if let Err(e) = color_eyre::install() {
        eprintln!("Warning: failed to install error report handler: {e}");
    }

    let cli = Cli::parse();
    init_tracing(cli.verbose);
    tracing::debug!("Parsed CLI arguments: {:?}", cli);

    match app::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` wins; otherwise `--verbose` selects debug and the default is warn.
fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "debug" } else { "warn" })
    });
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Warning: failed to initialise logging: {e}");
    }
}
