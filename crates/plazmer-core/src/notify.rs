//! Notification surface for download progress.
//!
//! Every download that reaches the finalizer gets exactly one `started` and
//! then exactly one of `completed` or `error` under the same id.

use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};

/// Notification identifier; stable for one download, distinct across
/// downloads started close together (even with equal names).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NotificationId(pub u32);

impl std::fmt::Display for NotificationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

/// Hands out notification ids: high half from the file name's hash, low half
/// from a process-wide counter.
#[derive(Debug, Default)]
pub struct NotificationIds {
    counter: AtomicU32,
}

impl NotificationIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_for(&self, name: &str) -> NotificationId {
        let digest = Sha256::digest(name.as_bytes());
        let hash = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
        let seq = self.counter.fetch_add(1, Ordering::Relaxed);
        NotificationId((hash & 0xFFFF_0000) | (seq & 0x0000_FFFF))
    }
}

/// What tapping a "completed" notification does: open `path` with the viewer
/// registered for `mime_type`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenAction {
    pub path: PathBuf,
    pub mime_type: String,
}

pub trait Notifier: Send + Sync {
    /// Indeterminate "download started" notification.
    fn started(&self, id: NotificationId, name: &str);
    /// Replaces the started notification.
    fn completed(&self, id: NotificationId, name: &str, open: &OpenAction);
    /// Replaces the started notification.
    fn error(&self, id: NotificationId, message: &str);
}

/// Opens a finished file with the platform's viewer.
pub trait FileOpener: Send + Sync {
    fn open(&self, action: &OpenAction) -> anyhow::Result<()>;
}

/// Notifier that only writes log lines; the default for headless hosts.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn started(&self, id: NotificationId, name: &str) {
        tracing::info!(notification = %id, name, "download started");
    }

    fn completed(&self, id: NotificationId, name: &str, open: &OpenAction) {
        tracing::info!(
            notification = %id,
            name,
            path = %open.path.display(),
            mime = %open.mime_type,
            "download completed"
        );
    }

    fn error(&self, id: NotificationId, message: &str) {
        tracing::warn!(notification = %id, "download failed: {}", message);
    }
}

/// Opener that does nothing; for hosts without a viewer.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopOpener;

impl FileOpener for NoopOpener {
    fn open(&self, action: &OpenAction) -> anyhow::Result<()> {
        tracing::debug!(path = %action.path.display(), "no viewer configured");
        Ok(())
    }
}
