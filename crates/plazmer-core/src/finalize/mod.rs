//! Storage finalizer: commits a download's bytes to permanent storage and
//! drives its notification from "started" to "completed" or "error".

mod store;

pub use store::{DownloadsDir, PublicStore};

use anyhow::{Context, Result};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Destination;
use crate::error::DownloadError;
use crate::host::SaveLocationPicker;
use crate::notify::{FileOpener, NotificationIds, Notifier, OpenAction};
use crate::request::DownloadRequest;

const COPY_BUF: usize = 64 * 1024;

/// Bytes ready to be committed.
#[derive(Debug)]
pub enum Payload {
    Bytes(Vec<u8>),
    /// A staging file (deleted once the permanent copy exists).
    Staged(PathBuf),
}

impl Payload {
    fn len_hint(&self) -> Option<u64> {
        match self {
            Payload::Bytes(b) => Some(b.len() as u64),
            Payload::Staged(p) => std::fs::metadata(p).ok().map(|m| m.len()),
        }
    }
}

/// How a finalize call ended when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinalizeOutcome {
    Saved(PathBuf),
    /// User dismissed the save picker, or none could be shown. Nothing written.
    Cancelled,
}

pub struct Finalizer {
    store: Arc<dyn PublicStore>,
    destination: Destination,
    picker: Option<Arc<dyn SaveLocationPicker>>,
    notifier: Arc<dyn Notifier>,
    opener: Arc<dyn FileOpener>,
    ids: NotificationIds,
}

impl Finalizer {
    pub fn new(
        store: Arc<dyn PublicStore>,
        notifier: Arc<dyn Notifier>,
        opener: Arc<dyn FileOpener>,
    ) -> Self {
        Self {
            store,
            destination: Destination::Public,
            picker: None,
            notifier,
            opener,
            ids: NotificationIds::new(),
        }
    }

    /// Ask `picker` for every destination instead of using the public store's location.
    pub fn with_picker(mut self, picker: Arc<dyn SaveLocationPicker>) -> Self {
        self.destination = Destination::UserChosen;
        self.picker = Some(picker);
        self
    }

    /// `UserChosen` without a picker cancels every download (no window to ask from).
    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    pub fn destination(&self) -> Destination {
        self.destination
    }

    /// Commit `payload` for `request`.
    ///
    /// Emits `started`, writes through the two-phase store, then emits
    /// `completed` (and asks the opener to show the file) or `error`.
    /// The returned error has already been reported to the notifier.
    pub async fn finalize(&self, request: &DownloadRequest, payload: Payload) -> Result<FinalizeOutcome> {
        let name = request.suggested_name().to_string();
        let mime = request.mime_type().to_string();

        let chosen = match self.choose_path(&name, &mime).await {
            Ok(chosen) => chosen,
            Err(e) if e.is_silent() => {
                tracing::info!(name = %name, "save location unavailable, download cancelled");
                return Ok(FinalizeOutcome::Cancelled);
            }
            Err(e) => return Err(e.into()),
        };
        let chosen = match (self.destination, chosen) {
            (Destination::UserChosen, None) => {
                tracing::info!(name = %name, "save picker dismissed");
                return Ok(FinalizeOutcome::Cancelled);
            }
            (_, chosen) => chosen,
        };

        let id = self.ids.next_for(&name);
        self.notifier.started(id, &name);

        let staged = match &payload {
            Payload::Staged(p) => Some(p.clone()),
            Payload::Bytes(_) => None,
        };

        let store = Arc::clone(&self.store);
        let name_for_write = name.clone();
        let written = tokio::task::spawn_blocking(move || {
            commit(store.as_ref(), &name_for_write, chosen.as_deref(), payload)
        })
        .await
        .context("finalize task failed")
        .and_then(|r| r);

        let path = match written {
            Ok(path) => path,
            Err(err) => {
                tracing::warn!(name = %name, "finalize failed: {:#}", err);
                self.notifier.error(id, &format!("{err:#}"));
                return Err(err);
            }
        };

        if let Some(staging) = staged {
            if let Err(e) = tokio::fs::remove_file(&staging).await {
                tracing::warn!(path = %staging.display(), "failed to remove staging file: {}", e);
            }
        }

        let open = OpenAction {
            path: path.clone(),
            mime_type: mime,
        };
        self.notifier.completed(id, &name, &open);
        if let Err(e) = self.opener.open(&open) {
            tracing::debug!(path = %path.display(), "open after download failed: {:#}", e);
        }
        tracing::info!(name = %name, path = %path.display(), "download saved");
        Ok(FinalizeOutcome::Saved(path))
    }

    /// Error notification for a download that failed before reaching storage
    /// (refused for space, OS transfer failed).
    pub fn report_failure(&self, name: &str, message: &str) {
        let id = self.ids.next_for(name);
        tracing::warn!(name, "download failed: {}", message);
        self.notifier.error(id, message);
    }

    async fn choose_path(&self, name: &str, mime: &str) -> Result<Option<PathBuf>, DownloadError> {
        if self.destination != Destination::UserChosen {
            return Ok(None);
        }
        let picker = self.picker.as_ref().ok_or(DownloadError::PickerUnavailable)?;
        picker.pick(name, mime).await.map_err(|e| {
            tracing::warn!("save picker failed: {:#}", e);
            DownloadError::PickerUnavailable
        })
    }
}

/// Reserve → write → publish, discarding the reservation on any failure.
fn commit(store: &dyn PublicStore, name: &str, at: Option<&Path>, payload: Payload) -> Result<PathBuf> {
    let size = payload.len_hint();
    let mut pending = match at {
        Some(path) => store.reserve_at(path, size)?,
        None => store.reserve(name, size)?,
    };

    let body = match payload {
        Payload::Bytes(bytes) => store.write(&mut pending, &bytes),
        Payload::Staged(path) => copy_staged(store, &mut pending, &path),
    };
    if let Err(e) = body {
        store.discard(pending);
        return Err(e);
    }

    // Publishing renames onto the final name; on failure the `.part` must go too.
    let temp = pending.temp_path().to_path_buf();
    store.publish(pending).map_err(|e| {
        let _ = std::fs::remove_file(&temp);
        e
    })
}

fn copy_staged(store: &dyn PublicStore, pending: &mut crate::storage::PendingFile, staging: &Path) -> Result<()> {
    let mut src = std::fs::File::open(staging).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            anyhow::Error::from(DownloadError::StagingMissing(staging.to_path_buf()))
        } else {
            anyhow::Error::from(e).context(format!("open {}", staging.display()))
        }
    })?;
    let mut buf = vec![0u8; COPY_BUF];
    loop {
        let n = src
            .read(&mut buf)
            .with_context(|| format!("read {}", staging.display()))?;
        if n == 0 {
            return Ok(());
        }
        store.write(pending, &buf[..n])?;
    }
}

#[cfg(test)]
mod tests;
