//! DTC-CLI: the `vehiclescan` command line.
//!
//! - `report`: extract, interpret, render, mail and store one report
//! - `purge`: drop reports past the retention period
//! - `list` / `languages`: inspect stored reports and catalogs

pub mod cli;
pub mod commands;
pub mod pipeline;

pub use cli::Cli;
pub use pipeline::{submit, App, ReportSummary, Submission, SubmitError};

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Log to stderr; `RUST_LOG` wins over the verbosity flag
pub fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}
