//! Capabilities the embedding platform provides to the download core.
//!
//! Each platform adapter (Android WebView, WebView2, WKWebView, the headless
//! CLI host) implements these; nothing in the core names a concrete adapter.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::request::DownloadRequest;

/// The embedded browser engine as seen by the core.
pub trait WebContentHost: Send + Sync {
    /// Run `script` in the current page without waiting for a result.
    /// Must be safe to call from any thread; adapters marshal to the UI thread.
    fn inject_script(&self, script: &str) -> anyhow::Result<()>;

    /// Run `script` and return its JSON-serialized result, when the engine supports it.
    fn evaluate_script(&self, script: &str) -> anyhow::Result<Option<String>> {
        self.inject_script(script)?;
        Ok(None)
    }
}

/// Yes/no prompt shown before any download starts. Suspends only the caller.
#[async_trait]
pub trait ConfirmPrompt: Send + Sync {
    async fn confirm(&self, title: &str, message: &str) -> bool;
}

/// Explicit "save as" destination chooser (desktop hosts).
#[async_trait]
pub trait SaveLocationPicker: Send + Sync {
    /// `Ok(None)` when the user cancels; `Err` when no picker/window can be shown.
    async fn pick(&self, suggested_name: &str, mime_type: &str) -> anyhow::Result<Option<PathBuf>>;
}

/// Handle to a transfer owned by the OS download manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SystemTransferId(pub i64);

/// Status sampled from the OS download manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferStatus {
    Pending,
    Running { bytes: u64, total: Option<u64> },
    Succeeded,
    Failed(String),
}

impl TransferStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransferStatus::Succeeded | TransferStatus::Failed(_))
    }
}

/// OS download manager (Android `DownloadManager` and friends).
#[async_trait]
pub trait SystemDownloader: Send + Sync {
    /// Start fetching `request` into `staging_path`.
    async fn enqueue(&self, request: &DownloadRequest, staging_path: &Path) -> anyhow::Result<SystemTransferId>;

    async fn status(&self, id: SystemTransferId) -> anyhow::Result<TransferStatus>;
}
