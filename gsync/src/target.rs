//! Transfer endpoints: `PATH` (local) or `SITE:PATH` (remote)

use common::error::{Error, Result};
use common::storage::{Location, Storage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// The endpoint is a directory tree; relative names are appended to it
    Directory,
    /// The endpoint is one file; relative names are ignored
    SingleFile,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetType<'a> {
    Local(&'a str),
    Remote { site: &'a str, path: &'a str },
}

/// Splits a raw target on `:`: no colon is a local path, one colon separates a site
/// name from a logical path and anything else is invalid.
pub fn parse_target(raw: &str) -> Result<TargetType<'_>> {
    let parts: Vec<&str> = raw.split(':').collect();
    match parts.as_slice() {
        [path] if !path.is_empty() => Ok(TargetType::Local(path)),
        [site, path] if !site.is_empty() && !path.is_empty() => {
            Ok(TargetType::Remote { site, path })
        }
        _ => Err(Error::InvalidTarget(raw.to_string())),
    }
}

/// Last non-empty `/` separated component of `path`.
fn base_name(path: &str) -> &str {
    path.rsplit('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or("")
}

/// One resolved endpoint of a transfer
#[derive(Debug, Clone)]
pub struct TargetDescriptor {
    raw: String,
    site: Option<String>,
    logical_path: String,
    /// resolved address of the endpoint itself, before any nesting
    resolved: Location,
    /// address relative names are appended to
    base: Location,
    name: String,
    mode: Mode,
}

impl TargetDescriptor {
    /// Resolves `raw` into a descriptor in directory mode.
    ///
    /// Remote targets are resolved through the site's rule table once, here.
    pub async fn new(raw: &str, resolver: &remote::Resolver) -> Result<Self> {
        let (site, logical_path, resolved) = match parse_target(raw)? {
            TargetType::Local(path) => (
                None,
                path.to_string(),
                Location::Local(std::path::absolute(path)?),
            ),
            TargetType::Remote { site, path } => {
                let url = resolver.resolve(site, path).await?;
                tracing::info!("{}:{} resolved to {}", site, path, url);
                (Some(site.to_string()), path.to_string(), Location::Remote(url))
            }
        };
        let name = base_name(&logical_path).to_string();
        Ok(Self {
            raw: raw.to_string(),
            site,
            logical_path,
            base: resolved.clone(),
            resolved,
            name,
            mode: Mode::Directory,
        })
    }

    /// Destination form: content lands under `source_name` inside this endpoint, or
    /// directly at this endpoint when `source_name` is empty. The descriptor takes the
    /// supplied name instead of deriving one from its own path.
    pub fn nested(&self, source_name: &str, mode: Mode) -> Self {
        Self {
            base: self.resolved.join(source_name),
            name: source_name.to_string(),
            mode,
            ..self.clone()
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn site(&self) -> Option<&str> {
        self.site.as_deref()
    }

    pub fn logical_path(&self) -> &str {
        &self.logical_path
    }

    pub fn is_local(&self) -> bool {
        self.site.is_none()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn base(&self) -> &Location {
        &self.base
    }

    /// Records what enumeration found out about the endpoint.
    pub fn refine_mode(&mut self, is_single_file: bool) {
        self.mode = if is_single_file {
            Mode::SingleFile
        } else {
            Mode::Directory
        };
    }

    /// Name a destination should nest this (source) endpoint's content under.
    pub fn nest_name(&self) -> &str {
        match self.mode {
            Mode::Directory => &self.name,
            Mode::SingleFile => "",
        }
    }

    pub fn location(&self, relative_name: &str) -> Location {
        match self.mode {
            Mode::Directory => self.base.join(relative_name),
            Mode::SingleFile => self.base.clone(),
        }
    }

    /// Addressable path of `relative_name`, as a URL (`file://` for local) or as a
    /// plain path/URL.
    pub fn full_path(&self, relative_name: &str, want_url: bool) -> String {
        let location = self.location(relative_name);
        if want_url {
            location.url()
        } else {
            location.to_string()
        }
    }

    /// Human readable name of a catalog entry: the endpoint name joined with it.
    pub fn display_name(&self, relative_name: &str) -> String {
        match (self.name.is_empty(), relative_name.is_empty()) {
            (_, true) => self.name.clone(),
            (true, false) => relative_name.to_string(),
            (false, false) => format!("{}/{}", self.name, relative_name),
        }
    }

    /// Size of `relative_name`, `None` when it does not exist or is not a file.
    pub async fn size<S: Storage>(&self, storage: &S, relative_name: &str) -> Result<Option<u64>> {
        Ok(storage
            .stat(&self.location(relative_name))
            .await?
            .filter(|entry| !entry.is_dir)
            .map(|entry| entry.size))
    }

    /// Removes `relative_name`.
    ///
    /// Without `force` this is best-effort cleanup: a missing local file is skipped and
    /// any failure is logged instead of returned.
    pub async fn delete<S: Storage>(
        &self,
        storage: &S,
        relative_name: &str,
        force: bool,
    ) -> Result<()> {
        let location = self.location(relative_name);
        if !force && location.is_local() && matches!(storage.stat(&location).await, Ok(None)) {
            tracing::debug!("nothing to remove at {}", location);
            return Ok(());
        }
        tracing::debug!("removing {} (force: {})", location, force);
        match storage.remove(&location).await {
            Ok(()) => Ok(()),
            Err(error) if force => Err(error),
            Err(error) => {
                tracing::warn!("ignoring failed removal of {}: {:#}", location, error);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::{Call, FakeStorage};

    fn no_sites() -> remote::Resolver {
        remote::Resolver::new(common::ResolverConfig {
            siteconf_root: "/nonexistent/siteconf".into(),
            ..Default::default()
        })
    }

    #[test]
    fn parse_target_local_and_remote() {
        assert_eq!(
            parse_target("/data/out").unwrap(),
            TargetType::Local("/data/out")
        );
        assert_eq!(
            parse_target("T2_IT_Pisa:/store/user/foo/bar").unwrap(),
            TargetType::Remote {
                site: "T2_IT_Pisa",
                path: "/store/user/foo/bar"
            }
        );
    }

    #[test]
    fn parse_target_rejects_malformed() {
        for raw in ["a:b:c", "site:", ":/store", "", "srm://host:8443/x"] {
            match parse_target(raw) {
                Err(Error::InvalidTarget(target)) => assert_eq!(target, raw),
                other => panic!("{raw:?} unexpectedly parsed as {other:?}"),
            }
        }
    }

    #[test]
    fn base_name_skips_trailing_slashes() {
        assert_eq!(base_name("/store/user/foo/bar/"), "bar");
        assert_eq!(base_name("bar"), "bar");
        assert_eq!(base_name("/"), "");
    }

    #[tokio::test]
    async fn remote_target_without_site_description_fails() {
        let error = TargetDescriptor::new("T2_XX_Nowhere:/store/x", &no_sites())
            .await
            .unwrap_err();
        assert!(matches!(error, Error::SiteNotFound { .. }));
    }

    #[tokio::test]
    async fn local_target_paths() -> anyhow::Result<()> {
        let target = TargetDescriptor::new("/data/src/run1", &no_sites()).await?;
        assert!(target.is_local());
        assert_eq!(target.name(), "run1");
        assert_eq!(target.mode(), Mode::Directory);
        assert_eq!(target.full_path("a/x", false), "/data/src/run1/a/x");
        assert_eq!(target.full_path("a/x", true), "file:///data/src/run1/a/x");
        assert_eq!(target.display_name("a/x"), "run1/a/x");
        Ok(())
    }

    #[tokio::test]
    async fn destination_nests_under_source_name() -> anyhow::Result<()> {
        let destination = TargetDescriptor::new("/data/dst", &no_sites()).await?;
        let nested = destination.nested("run1", Mode::Directory);
        assert_eq!(nested.name(), "run1");
        assert_eq!(nested.full_path("a/x", false), "/data/dst/run1/a/x");
        let direct = destination.nested("", Mode::SingleFile);
        assert_eq!(direct.full_path("ignored", false), "/data/dst");
        assert_eq!(direct.full_path("", true), "file:///data/dst");
        Ok(())
    }

    #[tokio::test]
    async fn single_file_source_does_not_nest() -> anyhow::Result<()> {
        let mut source = TargetDescriptor::new("/data/src/file.root", &no_sites()).await?;
        assert_eq!(source.nest_name(), "file.root");
        source.refine_mode(true);
        assert_eq!(source.mode(), Mode::SingleFile);
        assert_eq!(source.nest_name(), "");
        assert_eq!(source.full_path("", false), "/data/src/file.root");
        assert_eq!(source.display_name(""), "file.root");
        Ok(())
    }

    #[tokio::test]
    async fn size_and_delete() -> anyhow::Result<()> {
        let target = TargetDescriptor::new("/dst", &no_sites()).await?;
        let storage = FakeStorage::new();
        storage.add_file("/dst/a", 10);
        assert_eq!(target.size(&storage, "a").await?, Some(10));
        assert_eq!(target.size(&storage, "b").await?, None);
        // a missing local file is not even attempted without force
        target.delete(&storage, "b", false).await?;
        assert!(!storage.calls().iter().any(|call| matches!(call, Call::Remove(_))));
        // but it is an error with force
        assert!(target.delete(&storage, "b", true).await.is_err());
        target.delete(&storage, "a", true).await?;
        assert_eq!(target.size(&storage, "a").await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn directory_has_no_file_size() -> anyhow::Result<()> {
        let target = TargetDescriptor::new("/dst", &no_sites()).await?;
        let storage = FakeStorage::new();
        storage.add_dir("/dst/empty.dat");
        storage.add_file("/dst/run/x", 3);
        assert_eq!(target.size(&storage, "empty.dat").await?, None);
        assert_eq!(target.size(&storage, "run").await?, None);
        assert_eq!(target.size(&storage, "run/x").await?, Some(3));
        Ok(())
    }

    #[tokio::test]
    async fn non_forced_remote_delete_never_fails() -> anyhow::Result<()> {
        let tmp_dir = tempfile::tempdir()?;
        let site_dir = tmp_dir.path().join("T2_XX_Test");
        tokio::fs::create_dir_all(&site_dir).await?;
        tokio::fs::write(
            site_dir.join("storage.xml"),
            r#"<storage-mapping><lfn-to-pfn protocol="srmv2" path-match="/+(.*)" result="srm://se/$1"/></storage-mapping>"#,
        )
        .await?;
        let resolver = remote::Resolver::new(common::ResolverConfig {
            siteconf_root: tmp_dir.path().to_path_buf(),
            ..Default::default()
        });
        let target = TargetDescriptor::new("T2_XX_Test:/store/out", &resolver).await?;
        assert!(!target.is_local());
        assert_eq!(target.site(), Some("T2_XX_Test"));
        assert_eq!(target.logical_path(), "/store/out");
        assert_eq!(target.full_path("f", true), "srm://se/store/out/f");
        let storage = FakeStorage::new();
        target.delete(&storage, "f", false).await?;
        assert_eq!(
            storage.calls(),
            vec![Call::Remove(Location::Remote("srm://se/store/out/f".into()))]
        );
        assert!(target.delete(&storage, "f", true).await.is_err());
        Ok(())
    }
}
