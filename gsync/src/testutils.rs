//! In-memory [`Storage`] used by the unit tests

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};

use common::error::{Error, Result};
use common::listing::Entry;
use common::storage::{Location, Storage};

use crate::target::TargetDescriptor;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List(Location),
    Stat(Location),
    Remove(Location),
    Copy(Location, Location),
}

#[derive(Debug, Default)]
struct State {
    files: BTreeMap<String, u64>,
    dirs: BTreeSet<String>,
    calls: Vec<Call>,
    failing_copies: usize,
    always_fail: bool,
    partial_size: Option<u64>,
}

/// Files keyed by the display form of their location; directories exist implicitly
/// whenever a file lives below them.
#[derive(Debug, Default)]
pub struct FakeStorage {
    state: RefCell<State>,
}

fn tool_error(command: &str, location: &Location) -> Error {
    Error::Tool {
        command: format!("{command} {location}"),
        status: "exit status: 1".to_string(),
        stderr: "simulated failure".to_string(),
    }
}

impl FakeStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, path: &str, size: u64) {
        self.state.borrow_mut().files.insert(path.to_string(), size);
    }

    pub fn add_dir(&self, path: &str) {
        self.state.borrow_mut().dirs.insert(path.to_string());
    }

    pub fn size_of(&self, path: &str) -> Option<u64> {
        self.state.borrow().files.get(path).copied()
    }

    /// Makes the next `count` copies fail.
    pub fn fail_next_copies(&self, count: usize) {
        self.state.borrow_mut().failing_copies = count;
    }

    pub fn fail_all_copies(&self) {
        self.state.borrow_mut().always_fail = true;
    }

    /// Failed copies leave an object of `size` bytes behind.
    pub fn leave_partial(&self, size: u64) {
        self.state.borrow_mut().partial_size = Some(size);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    pub fn copies(&self) -> usize {
        self.count(|call| matches!(call, Call::Copy(..)))
    }

    pub fn removals(&self) -> usize {
        self.count(|call| matches!(call, Call::Remove(_)))
    }

    fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|call| predicate(call))
            .count()
    }

    fn is_dir(state: &State, key: &str) -> bool {
        let prefix = format!("{key}/");
        state.dirs.contains(key)
            || state.dirs.iter().any(|dir| dir.starts_with(&prefix))
            || state.files.keys().any(|file| file.starts_with(&prefix))
    }
}

impl Storage for FakeStorage {
    async fn list(&self, location: &Location) -> Result<Vec<Entry>> {
        let mut state = self.state.borrow_mut();
        state.calls.push(Call::List(location.clone()));
        let key = location.to_string();
        if !Self::is_dir(&state, &key) {
            return Err(Error::Listing {
                location: key,
                message: "No such file or directory".to_string(),
            });
        }
        let prefix = format!("{key}/");
        let mut children: BTreeMap<String, Entry> = BTreeMap::new();
        let paths = state
            .files
            .iter()
            .map(|(path, size)| (path.as_str(), Some(*size)))
            .chain(state.dirs.iter().map(|path| (path.as_str(), None)));
        for (path, size) in paths {
            let Some(rest) = path.strip_prefix(&prefix) else {
                continue;
            };
            let entry = match (rest.split_once('/'), size) {
                (Some((dir, _)), _) => Entry::dir(dir),
                (None, Some(size)) => Entry::file(rest, size),
                (None, None) => Entry::dir(rest),
            };
            children.insert(entry.name.clone(), entry);
        }
        Ok(children.into_values().collect())
    }

    async fn stat(&self, location: &Location) -> Result<Option<Entry>> {
        let mut state = self.state.borrow_mut();
        state.calls.push(Call::Stat(location.clone()));
        let key = location.to_string();
        let name = key.rsplit('/').next().unwrap_or_default().to_string();
        if let Some(size) = state.files.get(&key) {
            return Ok(Some(Entry::file(name, *size)));
        }
        if Self::is_dir(&state, &key) {
            return Ok(Some(Entry::dir(name)));
        }
        Ok(None)
    }

    async fn remove(&self, location: &Location) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.calls.push(Call::Remove(location.clone()));
        match state.files.remove(&location.to_string()) {
            Some(_) => Ok(()),
            None => Err(tool_error("rm", location)),
        }
    }

    async fn copy(&self, src: &Location, dst: &Location, _streams: u32) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.calls.push(Call::Copy(src.clone(), dst.clone()));
        let failing = state.always_fail || state.failing_copies > 0;
        if failing {
            state.failing_copies = state.failing_copies.saturating_sub(1);
            if let Some(size) = state.partial_size {
                state.files.insert(dst.to_string(), size);
            }
            return Err(tool_error("copy", dst));
        }
        match state.files.get(&src.to_string()).copied() {
            Some(size) => {
                state.files.insert(dst.to_string(), size);
                Ok(())
            }
            None => Err(tool_error("copy", src)),
        }
    }
}

fn resolver(siteconf_root: &std::path::Path) -> remote::Resolver {
    remote::Resolver::new(common::ResolverConfig {
        siteconf_root: siteconf_root.to_path_buf(),
        ..Default::default()
    })
}

pub async fn local_target(raw: &str) -> TargetDescriptor {
    TargetDescriptor::new(raw, &resolver("/nonexistent/siteconf".as_ref()))
        .await
        .unwrap()
}

/// Descriptor for `T2_XX_Test:<path>` where the site maps `/x` to `srm://se/x`.
pub async fn remote_target(path: &str) -> TargetDescriptor {
    let tmp_dir = tempfile::tempdir().unwrap();
    let site_dir = tmp_dir.path().join("T2_XX_Test");
    std::fs::create_dir_all(&site_dir).unwrap();
    std::fs::write(
        site_dir.join("storage.xml"),
        r#"<storage-mapping><lfn-to-pfn protocol="srmv2" path-match="/+(.*)" result="srm://se/$1"/></storage-mapping>"#,
    )
    .unwrap();
    TargetDescriptor::new(&format!("T2_XX_Test:{path}"), &resolver(tmp_dir.path()))
        .await
        .unwrap()
}
