//! Reconciliation of a destination with a source catalog
//!
//! Every [`FileRecord`] goes through a small state machine:
//!
//! ```text
//! Pending -> Verifying -> Verified
//!               ^   |
//!               |   v
//!              Copying -> Failed
//! ```
//!
//! Verification compares sizes only. A destination object of the wrong size is removed
//! before copying; a failed copy leaves whatever it wrote to a best-effort cleanup and
//! the file is verified again. Exceeding the try budget aborts the whole run.

use common::catalog::{Catalog, FileRecord};
use common::config::SyncConfig;
use common::error::{Error, Result};
use common::progress::{ProgressReporter, Status};
use common::storage::Storage;

use crate::target::TargetDescriptor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileState {
    Pending,
    Verifying,
    Copying,
    Verified,
    Failed,
}

/// Outcome of comparing a destination object with its source record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    InSync,
    Missing,
    Stale { size: u64 },
}

pub fn verdict(source_size: u64, destination_size: Option<u64>) -> Verdict {
    match destination_size {
        Some(size) if size == source_size => Verdict::InSync,
        Some(size) => Verdict::Stale { size },
        None => Verdict::Missing,
    }
}

/// Attempt bookkeeping for the record currently being reconciled
#[derive(Debug)]
pub struct TransferAttempt<'a> {
    pub file: &'a FileRecord,
    pub try_count: u32,
}

impl<'a> TransferAttempt<'a> {
    fn new(file: &'a FileRecord) -> Self {
        Self { file, try_count: 1 }
    }

    fn exhausted(&self, max_tries: u32) -> bool {
        self.try_count > max_tries
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub files_verified: usize,
    pub files_in_sync: usize,
    pub files_copied: usize,
    pub bytes_copied: u64,
    pub copy_attempts: usize,
    pub failed_attempts: usize,
    pub stale_removed: usize,
}

impl std::ops::Add for Summary {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self {
            files_verified: self.files_verified + other.files_verified,
            files_in_sync: self.files_in_sync + other.files_in_sync,
            files_copied: self.files_copied + other.files_copied,
            bytes_copied: self.bytes_copied + other.bytes_copied,
            copy_attempts: self.copy_attempts + other.copy_attempts,
            failed_attempts: self.failed_attempts + other.failed_attempts,
            stale_removed: self.stale_removed + other.stale_removed,
        }
    }
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, "files verified: {}", self.files_verified)?;
        writeln!(f, "already in sync: {}", self.files_in_sync)?;
        writeln!(f, "files copied: {}", self.files_copied)?;
        writeln!(
            f,
            "bytes copied: {}",
            bytesize::ByteSize(self.bytes_copied)
        )?;
        writeln!(f, "copy attempts: {}", self.copy_attempts)?;
        writeln!(f, "failed attempts: {}", self.failed_attempts)?;
        write!(f, "stale objects removed: {}", self.stale_removed)
    }
}

pub struct Engine<'a, S: Storage> {
    storage: &'a S,
    source: &'a TargetDescriptor,
    destination: &'a TargetDescriptor,
    config: SyncConfig,
    reporter: &'a ProgressReporter,
}

impl<'a, S: Storage> Engine<'a, S> {
    pub fn new(
        storage: &'a S,
        source: &'a TargetDescriptor,
        destination: &'a TargetDescriptor,
        config: SyncConfig,
        reporter: &'a ProgressReporter,
    ) -> Self {
        Self {
            storage,
            source,
            destination,
            config,
            reporter,
        }
    }

    /// Reconciles every record of `catalog`, strictly in catalog order.
    pub async fn run(&self, catalog: &Catalog) -> Result<Summary> {
        let mut status = Status {
            files_done: 0,
            total_files: catalog.len(),
            bytes_done: 0,
            total_bytes: catalog.total_bytes(),
        };
        let mut summary = Summary::default();
        for file in catalog {
            summary = summary + self.reconcile(file, &status).await?;
            status.files_done += 1;
            status.bytes_done += file.size;
        }
        Ok(summary)
    }

    #[tracing::instrument(skip_all, fields(file = %file.relative_name))]
    async fn reconcile(&self, file: &FileRecord, status: &Status) -> Result<Summary> {
        let display_name = self.source.display_name(&file.relative_name);
        let mut attempt = TransferAttempt::new(file);
        let mut summary = Summary::default();
        let mut state = FileState::Pending;
        loop {
            tracing::trace!("{:?} (try {})", state, attempt.try_count);
            state = match state {
                FileState::Pending => FileState::Verifying,
                FileState::Verifying => self.verify(&attempt, &mut summary).await?,
                FileState::Copying if attempt.exhausted(self.config.max_tries) => {
                    FileState::Failed
                }
                FileState::Copying => {
                    self.reporter
                        .copy_attempt(status, &display_name, file.size, attempt.try_count);
                    summary.copy_attempts += 1;
                    self.copy(&display_name, &mut attempt, &mut summary).await?;
                    FileState::Verifying
                }
                FileState::Verified => {
                    self.reporter.file_verified(status, &display_name);
                    summary.files_verified += 1;
                    if attempt.try_count == 1 {
                        summary.files_in_sync += 1;
                    } else if !self.config.dry_run {
                        summary.files_copied += 1;
                        summary.bytes_copied += file.size;
                    }
                    return Ok(summary);
                }
                FileState::Failed => {
                    return Err(Error::TransferExhausted {
                        name: display_name,
                        max_tries: self.config.max_tries,
                    });
                }
            };
        }
    }

    async fn verify(
        &self,
        attempt: &TransferAttempt<'_>,
        summary: &mut Summary,
    ) -> Result<FileState> {
        let file = attempt.file;
        if self.config.dry_run && attempt.try_count > 1 {
            return Ok(FileState::Verified);
        }
        let destination_size = self
            .destination
            .size(self.storage, &file.relative_name)
            .await?;
        match verdict(file.size, destination_size) {
            Verdict::InSync => Ok(FileState::Verified),
            Verdict::Missing => Ok(FileState::Copying),
            Verdict::Stale { size } => {
                tracing::info!(
                    "{} has {} bytes instead of {}, replacing it",
                    self.destination.full_path(&file.relative_name, false),
                    size,
                    file.size
                );
                if !self.config.dry_run {
                    self.destination
                        .delete(self.storage, &file.relative_name, true)
                        .await?;
                    summary.stale_removed += 1;
                }
                Ok(FileState::Copying)
            }
        }
    }

    async fn copy(
        &self,
        display_name: &str,
        attempt: &mut TransferAttempt<'_>,
        summary: &mut Summary,
    ) -> Result<()> {
        let relative_name = &attempt.file.relative_name;
        let src = self.source.location(relative_name);
        let dst = self.destination.location(relative_name);
        if self.config.dry_run {
            tracing::info!("dry run: would copy {} -> {}", src, dst);
        } else {
            match self.storage.copy(&src, &dst, self.config.streams).await {
                Ok(()) => {}
                Err(error @ Error::Tool { .. }) => {
                    tracing::info!("copy of {} failed: {:#}", display_name, error);
                    self.reporter.copy_failed(display_name, &error);
                    summary.failed_attempts += 1;
                    self.destination
                        .delete(self.storage, relative_name, false)
                        .await?;
                }
                Err(error) => return Err(error),
            }
        }
        attempt.try_count += 1;
        Ok(())
    }
}
