//! [`Storage`] backed by the gfal command line tools
//!
//! Local locations are served by the native primitives of [`common::storage::local`];
//! remote locations go through `gfal-ls`, `gfal-rm` and `gfal-copy` (or whatever programs
//! the [`ToolConfig`] names). Copies always go through the copy tool, with local paths
//! passed as `file://` URLs.

use common::config::ToolConfig;
use common::error::{Error, Result};
use common::listing::{Entry, parse_listing};
use common::storage::{Location, Storage, local};

use crate::tool;

#[derive(Debug, Clone, Default)]
pub struct GfalStorage {
    tools: ToolConfig,
}

impl GfalStorage {
    pub fn new(tools: ToolConfig) -> Self {
        Self { tools }
    }

    async fn list_remote(&self, url: &str) -> Result<Vec<Entry>> {
        let output = tool::run(&self.tools.ls, &["-l".to_string(), url.to_string()]).await?;
        if !output.succeeded() {
            let message = if output.stderr.trim().is_empty() {
                format!("{} exited with {}", self.tools.ls, output.status)
            } else {
                output.stderr.trim().to_string()
            };
            return Err(Error::Listing {
                location: url.to_string(),
                message,
            });
        }
        parse_listing(url, &output.stdout)
    }

    async fn stat_remote(&self, url: &str) -> Result<Option<Entry>> {
        let output = tool::run(
            &self.tools.ls,
            &["-l".to_string(), "-d".to_string(), url.to_string()],
        )
        .await?;
        if !output.succeeded() {
            tracing::debug!("{} not found: {}", url, output.stderr.trim());
            return Ok(None);
        }
        let mut entries = parse_listing(url, &output.stdout)?;
        if entries.len() != 1 {
            return Err(Error::VerificationAmbiguity {
                location: url.to_string(),
                rows: entries.len(),
            });
        }
        Ok(entries.pop())
    }
}

impl Storage for GfalStorage {
    async fn list(&self, location: &Location) -> Result<Vec<Entry>> {
        match location {
            Location::Local(path) => local::list(path).await,
            Location::Remote(url) => self.list_remote(url).await,
        }
    }

    async fn stat(&self, location: &Location) -> Result<Option<Entry>> {
        match location {
            Location::Local(path) => local::stat(path).await,
            Location::Remote(url) => self.stat_remote(url).await,
        }
    }

    async fn remove(&self, location: &Location) -> Result<()> {
        match location {
            Location::Local(path) => local::remove(path).await,
            Location::Remote(url) => {
                let output = tool::run(&self.tools.rm, std::slice::from_ref(url)).await?;
                if output.succeeded() {
                    Ok(())
                } else {
                    Err(output.into_error())
                }
            }
        }
    }

    async fn copy(&self, src: &Location, dst: &Location, streams: u32) -> Result<()> {
        let args = vec![
            "-p".to_string(),
            "-n".to_string(),
            streams.to_string(),
            src.url(),
            dst.url(),
        ];
        let output = tool::run(&self.tools.copy, &args).await?;
        if output.succeeded() {
            Ok(())
        } else {
            Err(output.into_error())
        }
    }
}
