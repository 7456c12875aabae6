//! Error taxonomy shared by all gsync tools
//!
//! Every variant is fatal for the run that raised it, except [`Error::Tool`] which the
//! transfer engine treats as a failed attempt and retries.

/// Errors raised while resolving, listing or transferring files.
///
/// # Logging Convention
/// The Display implementation is self-contained, so it can be logged with any format
/// specifier:
/// ```ignore
/// tracing::error!("sync failed: {}", &error);
/// tracing::error!("sync failed: {:#}", &error);
/// ```
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// None of the probed site description files exists.
    #[error("storage description for site {site} not found (looked for {})", display_paths(.candidates))]
    SiteNotFound {
        site: String,
        candidates: Vec<std::path::PathBuf>,
    },

    /// The site description exists but could not be read or parsed.
    #[error("unable to parse storage description {path:?}: {message}")]
    SiteDescription {
        path: std::path::PathBuf,
        message: String,
    },

    /// No rule of the requested protocol matches the logical path.
    #[error("protocol {protocol} has no rule matching {path:?}")]
    NoMatchingRule { protocol: String, path: String },

    /// A rule carries an invalid pattern or lacks a result template.
    #[error("invalid lfn-to-pfn rule for protocol {protocol}: {message}")]
    InvalidRule { protocol: String, message: String },

    /// The target is neither `PATH` nor `SITE:PATH`.
    #[error("invalid target {0:?}: expected PATH or SITE:PATH")]
    InvalidTarget(String),

    /// The listing primitive reported diagnostics while enumerating.
    #[error("listing {location} failed: {message}")]
    Listing { location: String, message: String },

    /// A single file did not converge within the allowed number of tries.
    #[error("max number of tries ({max_tries}) is reached while transferring {name:?}")]
    TransferExhausted { name: String, max_tries: u32 },

    /// A presumed single object listed as zero or several rows.
    #[error("unable to get size of {location}: listing returned {rows} rows")]
    VerificationAmbiguity { location: String, rows: usize },

    /// An external primitive failed (non-zero status or diagnostic output).
    #[error("{command} failed ({status}): {stderr}")]
    Tool {
        command: String,
        status: String,
        stderr: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for the pre-flight address resolution failures.
    pub fn is_resolution(&self) -> bool {
        matches!(
            self,
            Error::SiteNotFound { .. }
                | Error::SiteDescription { .. }
                | Error::NoMatchingRule { .. }
                | Error::InvalidRule { .. }
        )
    }
}

fn display_paths(paths: &[std::path::PathBuf]) -> String {
    paths
        .iter()
        .map(|path| format!("{path:?}"))
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, Error>;
