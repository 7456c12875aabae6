use common::catalog::{Catalog, FileRecord};
use common::error::Result;
use common::filter::{FilterResult, FilterSettings};
use common::storage::Storage;

use crate::target::TargetDescriptor;

/// Walks the tree below `target` and collects every file that passes `filter`.
///
/// The target itself is probed first: when it is a plain file the catalog holds that one
/// file (with an empty relative name) and the returned flag is `true`. Directories are
/// walked depth-first; the catalog is sorted in natural order once the walk is over.
#[tracing::instrument(skip_all, fields(root = %target.raw()))]
pub async fn enumerate<S: Storage>(
    storage: &S,
    target: &TargetDescriptor,
    filter: &FilterSettings,
) -> Result<(Catalog, bool)> {
    let root = target.base();
    if let Some(entry) = storage.stat(root).await?.filter(|entry| !entry.is_dir) {
        tracing::debug!("{} is a single file of {} bytes", root, entry.size);
        return Ok((Catalog::from_records(vec![FileRecord::new("", entry.size)]), true));
    }
    let mut records = vec![];
    let mut pending = vec![String::new()];
    while let Some(folder) = pending.pop() {
        let location = root.join(&folder);
        tracing::debug!("listing {}", location);
        let mut subfolders = vec![];
        for entry in storage.list(&location).await? {
            let relative_name = if folder.is_empty() {
                entry.name
            } else {
                format!("{}/{}", folder, entry.name)
            };
            if entry.is_dir {
                subfolders.push(relative_name);
                continue;
            }
            match filter.should_include(&relative_name) {
                FilterResult::Included => {
                    tracing::trace!("found {} ({} bytes)", relative_name, entry.size);
                    records.push(FileRecord::new(relative_name, entry.size));
                }
                FilterResult::ExcludedByDefault => {
                    tracing::debug!("skipping {}: no include pattern match", relative_name);
                }
                FilterResult::ExcludedByPattern(pattern) => {
                    tracing::debug!("skipping {}: matches exclude {:?}", relative_name, pattern);
                }
            }
        }
        // visit sub-folders in listing order
        pending.extend(subfolders.into_iter().rev());
    }
    tracing::info!("found {} file(s) under {}", records.len(), root);
    Ok((Catalog::from_records(records), false))
}
