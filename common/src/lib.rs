//! Common library for gsync tools
//!
//! This crate holds the pieces shared by the `gsync` and `gls` binaries and by the
//! `remote` crate:
//!
//! - [`error`]: the error taxonomy of a synchronization run
//! - [`config`]: explicit configuration structs (no global state)
//! - [`catalog`]: file records and their natural ordering
//! - [`filter`]: include/exclude regular expressions
//! - [`listing`]: parser for `ls -l` style listing output
//! - [`storage`]: the [`storage::Storage`] capability and native local primitives
//! - [`progress`]: progress reporting
//!
//! [`run`] bootstraps logging and a single-threaded tokio runtime for a tool's main
//! function.

pub mod catalog;
pub mod config;
pub mod error;
pub mod filter;
pub mod listing;
pub mod progress;
pub mod storage;

pub use config::{OutputConfig, ResolverConfig, SyncConfig, ToolConfig};
pub use error::{Error, Result};
pub use progress::ProgressType;

fn log_level(output: &OutputConfig) -> &'static str {
    if output.quiet {
        return "off";
    }
    match output.verbose {
        0 => "error",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn init_logging(output: &OutputConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level(output)));
    // a subscriber may already be installed when run from tests
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// Runs `func` to completion on a single-threaded runtime.
///
/// Returns the summary on success. On failure the error is printed to stderr (unless
/// quiet) and `None` is returned; callers translate that into a non-zero exit code.
pub fn run<Fut, Summary, Error>(output: OutputConfig, func: impl FnOnce() -> Fut) -> Option<Summary>
where
    Summary: std::fmt::Display,
    Error: std::fmt::Display,
    Fut: std::future::Future<Output = std::result::Result<Summary, Error>>,
{
    init_logging(&output);
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(error) => {
            eprintln!("failed to start the runtime: {error:#}");
            return None;
        }
    };
    match runtime.block_on(func()) {
        Ok(summary) => {
            if output.print_summary || output.verbose > 0 {
                println!("{summary}");
            }
            Some(summary)
        }
        Err(error) => {
            tracing::debug!("run failed: {:#}", &error);
            if !output.quiet {
                eprintln!("{error:#}");
            }
            None
        }
    }
}
