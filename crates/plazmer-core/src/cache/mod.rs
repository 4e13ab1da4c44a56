//! Content-addressable offline cache.
//!
//! One file per URL, named by [`cache_key`]. The file holds the MIME type on
//! its first line followed by the raw payload; its modification time is the
//! entry's last access. There is no manifest: a file existing is the entry
//! existing.

mod key;
mod sweep;

pub use key::{cache_key, normalize_url};
pub use sweep::SweepReport;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::storage::TEMP_SUFFIX;

/// A cached resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub last_accessed: SystemTime,
}

/// Disk cache rooted at one directory. Clones share the same write lock.
#[derive(Debug, Clone)]
pub struct DiskCache {
    dir: PathBuf,
    // Held only around the rename that publishes an entry.
    publish: Arc<Mutex<()>>,
    tmp_seq: Arc<AtomicU64>,
}

impl DiskCache {
    /// Open (and create if missing) the cache directory.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("create cache dir: {}", dir.display()))?;
        Ok(Self {
            dir,
            publish: Arc::new(Mutex::new(())),
            tmp_seq: Arc::new(AtomicU64::new(0)),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the entry file for `url` (whether or not it exists).
    pub fn entry_path(&self, url: &str) -> PathBuf {
        self.dir.join(cache_key(url))
    }

    /// Read the entry for `url`, refreshing its last-access time.
    pub async fn get(&self, url: &str) -> Result<Option<CacheEntry>> {
        let path = self.entry_path(url);
        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).with_context(|| format!("read cache entry: {}", path.display())),
        };

        let Some((mime_type, bytes)) = decode_entry(raw) else {
            tracing::warn!(path = %path.display(), "malformed cache entry, dropping");
            let _ = tokio::fs::remove_file(&path).await;
            return Ok(None);
        };

        let last_accessed = touch(path).await?;
        Ok(Some(CacheEntry {
            bytes,
            mime_type,
            last_accessed,
        }))
    }

    /// Store `bytes` for `url`, replacing any previous entry (last write wins).
    pub async fn put(&self, url: &str, bytes: &[u8], mime_type: &str) -> Result<()> {
        let path = self.entry_path(url);
        let seq = self.tmp_seq.fetch_add(1, Ordering::Relaxed);
        let mut tmp = path.clone().into_os_string();
        tmp.push(format!(".{}.{seq}{TEMP_SUFFIX}", std::process::id()));
        let tmp = PathBuf::from(tmp);

        // Body goes out before taking the lock; only the rename is serialized.
        let mut body = Vec::with_capacity(mime_type.len() + 1 + bytes.len());
        body.extend_from_slice(mime_type.trim().as_bytes());
        body.push(b'\n');
        body.extend_from_slice(bytes);
        tokio::fs::write(&tmp, &body)
            .await
            .with_context(|| format!("write cache temp: {}", tmp.display()))?;

        let _guard = self.publish.lock().await;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e).with_context(|| format!("publish cache entry: {}", path.display()));
        }
        tracing::debug!(url, bytes = bytes.len(), "cached");
        Ok(())
    }

    /// Remove the entry for `url`. Missing entries are not an error.
    pub async fn remove(&self, url: &str) -> Result<bool> {
        let path = self.entry_path(url);
        let _guard = self.publish.lock().await;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("remove cache entry: {}", path.display())),
        }
    }

    /// Evict entries whose last access is older than `retention`.
    pub async fn sweep(&self, retention: Duration) -> SweepReport {
        self.sweep_at(retention, SystemTime::now()).await
    }

    /// [`sweep`](Self::sweep) evaluated at a fixed `now`.
    pub async fn sweep_at(&self, retention: Duration, now: SystemTime) -> SweepReport {
        sweep::sweep_dir(&self.dir, retention, now).await
    }

    /// Sweep now and then every `interval` until the returned task is aborted.
    pub fn spawn_periodic_sweep(&self, retention: Duration, interval: Duration) -> JoinHandle<()> {
        let cache = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let report = cache.sweep(retention).await;
                tracing::debug!(
                    removed = report.removed,
                    kept = report.kept,
                    failed = report.failed,
                    "cache sweep finished"
                );
            }
        })
    }
}

fn decode_entry(mut raw: Vec<u8>) -> Option<(String, Vec<u8>)> {
    let nl = raw.iter().position(|b| *b == b'\n')?;
    let mime = std::str::from_utf8(&raw[..nl]).ok()?.to_string();
    let bytes = raw.split_off(nl + 1);
    Some((mime, bytes))
}

/// Set the entry's modification time to now and return it.
async fn touch(path: PathBuf) -> Result<SystemTime> {
    tokio::task::spawn_blocking(move || -> Result<SystemTime> {
        let now = SystemTime::now();
        let file = std::fs::OpenOptions::new()
            .append(true)
            .open(&path)
            .with_context(|| format!("open cache entry: {}", path.display()))?;
        file.set_modified(now)
            .with_context(|| format!("touch cache entry: {}", path.display()))?;
        Ok(now)
    })
    .await
    .context("touch task failed")?
}
