//! Storage capability used by the enumerator and the transfer engine
//!
//! A [`Location`] is either a local filesystem path or a remote access URL. The
//! [`Storage`] trait exposes the four primitives the synchronization needs; the real
//! implementation handles local locations natively (see [`local`]) and remote ones by
//! running external tools, while tests substitute an in-memory fake.

use crate::error::{Error, Result};
use crate::listing::Entry;

/// Address of an object or directory on either side of a transfer
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Location {
    Local(std::path::PathBuf),
    Remote(String),
}

impl Location {
    /// Location of `relative` below this one; an empty `relative` is this location.
    pub fn join(&self, relative: &str) -> Location {
        if relative.is_empty() {
            return self.clone();
        }
        match self {
            Location::Local(path) => Location::Local(path.join(relative)),
            Location::Remote(url) => {
                Location::Remote(format!("{}/{}", url.trim_end_matches('/'), relative))
            }
        }
    }

    /// URL form understood by the copy primitive (`file://` for local paths).
    pub fn url(&self) -> String {
        match self {
            Location::Local(path) => format!("file://{}", path.display()),
            Location::Remote(url) => url.clone(),
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Location::Local(_))
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Location::Local(path) => write!(f, "{}", path.display()),
            Location::Remote(url) => write!(f, "{url}"),
        }
    }
}

/// Listing, probing, deletion and copy primitives.
///
/// Every call blocks the caller until the underlying primitive has completed; there is
/// no overlap between calls.
#[allow(async_fn_in_trait)]
pub trait Storage {
    /// Entries directly inside the directory at `location`.
    ///
    /// Any diagnostic reported by the primitive is an [`Error::Listing`].
    async fn list(&self, location: &Location) -> Result<Vec<Entry>>;

    /// The object at `location` itself, `None` when it does not exist.
    ///
    /// A listing that yields anything but exactly one row is an
    /// [`Error::VerificationAmbiguity`].
    async fn stat(&self, location: &Location) -> Result<Option<Entry>>;

    async fn remove(&self, location: &Location) -> Result<()>;

    /// Transfers one file using `streams` parallel streams.
    ///
    /// A failed transfer is reported as [`Error::Tool`] and may leave a partial object.
    async fn copy(&self, src: &Location, dst: &Location, streams: u32) -> Result<()>;
}

/// Native implementations of the primitives for local paths
pub mod local {
    use super::*;

    fn file_name(path: &std::path::Path) -> String {
        path.file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub async fn list(path: &std::path::Path) -> Result<Vec<Entry>> {
        let listing_error = |error: std::io::Error| Error::Listing {
            location: path.display().to_string(),
            message: error.to_string(),
        };
        let mut entries = tokio::fs::read_dir(path).await.map_err(listing_error)?;
        let mut result = vec![];
        while let Some(entry) = entries.next_entry().await.map_err(listing_error)? {
            let entry_path = entry.path();
            let metadata = tokio::fs::metadata(&entry_path)
                .await
                .map_err(listing_error)?;
            result.push(Entry {
                name: file_name(&entry_path),
                size: if metadata.is_dir() { 0 } else { metadata.len() },
                is_dir: metadata.is_dir(),
            });
        }
        Ok(result)
    }

    pub async fn stat(path: &std::path::Path) -> Result<Option<Entry>> {
        match tokio::fs::metadata(path).await {
            Ok(metadata) => Ok(Some(Entry {
                name: file_name(path),
                size: if metadata.is_dir() { 0 } else { metadata.len() },
                is_dir: metadata.is_dir(),
            })),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    pub async fn remove(path: &std::path::Path) -> Result<()> {
        tokio::fs::remove_file(path).await?;
        Ok(())
    }
}
