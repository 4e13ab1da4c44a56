//! Pending (`.part`) file: reserve, write, publish.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
#[cfg(any(target_os = "linux", target_os = "android"))]
use std::os::unix::io::AsRawFd;

use super::temp_path;

/// A reserved destination. Until [`publish`](Self::publish) succeeds the data
/// lives only under the `.part` name, which listings treat as unfinished.
#[derive(Debug)]
pub struct PendingFile {
    file: File,
    temp_path: PathBuf,
    final_path: PathBuf,
    written: u64,
}

impl PendingFile {
    /// Reserve `final_path` by creating `final_path.part` (truncating a stale one).
    pub fn reserve(final_path: &Path) -> Result<Self> {
        let temp_path = temp_path(final_path);
        let file = File::options()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)
            .with_context(|| format!("failed to reserve {}", temp_path.display()))?;
        Ok(Self {
            file,
            temp_path,
            final_path: final_path.to_path_buf(),
            written: 0,
        })
    }

    /// Preallocate `size` bytes. On Linux/Android tries `posix_fallocate` so a
    /// full disk fails here rather than mid-write; falls back to `set_len`.
    pub fn preallocate(&mut self, size: u64) -> Result<()> {
        #[cfg(any(target_os = "linux", target_os = "android"))]
        {
            let fd = self.file.as_raw_fd();
            let r = unsafe { libc::posix_fallocate(fd, 0, size as libc::off_t) };
            if r == 0 {
                return Ok(());
            }
            if r == libc::ENOSPC {
                anyhow::bail!("no space left for {} bytes", size);
            }
            tracing::debug!(errno = r, "posix_fallocate failed, falling back to set_len");
        }
        self.file
            .set_len(size)
            .context("failed to preallocate file")?;
        Ok(())
    }

    /// Append `data` at the current end of the written region.
    pub fn write_all(&mut self, data: &[u8]) -> Result<()> {
        self.file
            .write_all(data)
            .with_context(|| format!("write {}", self.temp_path.display()))?;
        self.written += data.len() as u64;
        Ok(())
    }

    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    /// Trim any preallocated tail, sync, and rename onto the final name.
    pub fn publish(self) -> Result<PathBuf> {
        self.file
            .set_len(self.written)
            .context("failed to trim pending file")?;
        self.file.sync_all().context("storage sync failed")?;
        let Self {
            file,
            temp_path,
            final_path,
            ..
        } = self;
        drop(file);

        std::fs::rename(&temp_path, &final_path).with_context(|| {
            format!(
                "failed to rename {} to {}",
                temp_path.display(),
                final_path.display()
            )
        })?;
        Ok(final_path)
    }

    /// Drop the reservation and delete the partial data.
    pub fn discard(self) {
        let Self { file, temp_path, .. } = self;
        drop(file);
        if let Err(e) = std::fs::remove_file(&temp_path) {
            tracing::warn!(path = %temp_path.display(), "failed to discard pending file: {}", e);
        }
    }
}
