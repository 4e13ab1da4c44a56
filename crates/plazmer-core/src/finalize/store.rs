//! Destinations finished downloads are committed to.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::storage::{self, PendingFile};

/// Two-phase writable destination: reserve a pending entry, write the body,
/// then publish (clear the pending flag). Until publish, the entry must not
/// be visible as a finished file.
pub trait PublicStore: Send + Sync {
    /// Reserve a pending entry named after `name` in the store's own location.
    fn reserve(&self, name: &str, size_hint: Option<u64>) -> Result<PendingFile>;

    /// Reserve a pending entry at an explicit path (user-chosen destination).
    fn reserve_at(&self, path: &Path, size_hint: Option<u64>) -> Result<PendingFile> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create dir: {}", parent.display()))?;
        }
        let mut pending = PendingFile::reserve(path)?;
        if let Some(size) = size_hint {
            if let Err(e) = pending.preallocate(size) {
                pending.discard();
                return Err(e);
            }
        }
        Ok(pending)
    }

    fn write(&self, pending: &mut PendingFile, bytes: &[u8]) -> Result<()> {
        pending.write_all(bytes)
    }

    fn publish(&self, pending: PendingFile) -> Result<PathBuf> {
        pending.publish()
    }

    fn discard(&self, pending: PendingFile) {
        pending.discard()
    }
}

/// The shared "Downloads" directory.
#[derive(Debug, Clone)]
pub struct DownloadsDir {
    dir: PathBuf,
}

impl DownloadsDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Finished files only; `.part` reservations are never listed.
    pub fn list_finished(&self) -> Result<Vec<PathBuf>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        storage::list_finished(&self.dir)
    }

    /// Remove reservations left behind by an interrupted run.
    pub fn cleanup_pending(&self) -> usize {
        storage::cleanup_pending(&self.dir)
    }
}

impl PublicStore for DownloadsDir {
    fn reserve(&self, name: &str, size_hint: Option<u64>) -> Result<PendingFile> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("create downloads dir: {}", self.dir.display()))?;
        let final_path = storage::unique_destination(&self.dir, name);
        self.reserve_at(&final_path, size_hint)
    }
}
