//! Size-verified, retrying synchronization of file trees between local paths and grid
//! storage sites
//!
//! A run resolves both endpoints up front, enumerates the source into a naturally sorted
//! [`common::catalog::Catalog`] and then reconciles the destination one file at a time
//! (see [`engine`]). Re-running a finished or interrupted synchronization only transfers
//! what is missing or has the wrong size.
//!
//! # Endpoints
//!
//! A target is either a local path (`/data/ntuples`) or `SITE:/logical/path`
//! (`T2_IT_Pisa:/store/user/me/ntuples`). Remote targets are translated into access URLs
//! with the site's `lfn-to-pfn` rules, see [`remote::resolver`].
//!
//! When the source is a directory, its content lands in a sub-directory of the
//! destination named after the source. A single file source is written to the destination
//! path itself.

pub mod engine;
pub mod enumerate;
pub mod target;

#[cfg(test)]
mod testutils;

pub use engine::Summary;
pub use target::TargetDescriptor;

use common::filter::FilterSettings;
use common::progress::{ProgressReporter, ProgressType};
use common::storage::Storage;

/// Everything a run needs besides the endpoints
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub sync: common::SyncConfig,
    pub filter: FilterSettings,
    pub progress_type: ProgressType,
    pub quiet: bool,
}

/// Synchronizes `source` into `destination`.
///
/// Both targets are resolved before anything is listed, so a malformed target or an
/// unknown site fails the run without touching any storage.
pub async fn sync<S: Storage>(
    storage: &S,
    resolver: &remote::Resolver,
    source: &str,
    destination: &str,
    settings: &Settings,
) -> common::Result<Summary> {
    let mut source_target = TargetDescriptor::new(source, resolver).await?;
    let destination_root = TargetDescriptor::new(destination, resolver).await?;
    let reporter = ProgressReporter::new(settings.progress_type, settings.quiet, 0);
    reporter.message(&format!("\"{source}\" -> \"{destination}\""));
    let (catalog, is_single_file) =
        enumerate::enumerate(storage, &source_target, &settings.filter).await?;
    source_target.refine_mode(is_single_file);
    let destination_target = destination_root.nested(source_target.nest_name(), source_target.mode());
    tracing::info!(
        "{} file(s), {} bytes: {} -> {}",
        catalog.len(),
        catalog.total_bytes(),
        source_target.base(),
        destination_target.base()
    );
    reporter.set_total_bytes(catalog.total_bytes());
    let engine = engine::Engine::new(
        storage,
        &source_target,
        &destination_target,
        settings.sync,
        &reporter,
    );
    let result = engine.run(&catalog).await;
    reporter.finish();
    let summary = result?;
    reporter.message(&format!(
        "\"{source}\" -> \"{destination}\" successfully finished."
    ));
    Ok(summary)
}
