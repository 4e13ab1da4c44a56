//! CLI command handlers, one file per command.

mod age;
mod cache;
mod classify;
mod cleanup;
mod download_start;
mod open;
mod save_blob;
mod script;

pub use age::run_age;
pub use cache::run_cache;
pub use classify::run_classify;
pub use cleanup::run_cleanup;
pub use download_start::run_download_start;
pub use open::run_open;
pub use save_blob::run_save_blob;
pub use script::run_script;

use anyhow::Result;
use plazmer_core::config::PlazmerConfig;
use plazmer_core::prefs::Preferences;
use plazmer_core::{DownloadService, HostParts};
use std::sync::Arc;

use super::host::{HeadlessHost, StdoutNotifier, TerminalPrompt};

/// Service wired to the terminal, plus the notifier so callers can check failures.
pub(crate) struct Session {
    pub service: DownloadService,
    pub notifier: Arc<StdoutNotifier>,
}

impl Session {
    /// Refuses to start until the age gate has been passed.
    pub async fn start(cfg: PlazmerConfig, assume_yes: bool) -> Result<Self> {
        let prefs = Preferences::load_default()?;
        if !prefs.content_allowed() {
            anyhow::bail!("content is blocked until the age gate is passed (run `plazmer age --set true`)");
        }

        let notifier = Arc::new(StdoutNotifier::default());
        let mut parts = HostParts::new(Arc::new(HeadlessHost), Arc::new(TerminalPrompt::new(assume_yes)));
        parts.notifier = notifier.clone();
        let service = DownloadService::init(cfg, parts).await?;
        Ok(Self { service, notifier })
    }

    /// Wait for queued jobs, stop the service, fail if any download failed.
    pub async fn finish(self) -> Result<()> {
        self.service.queue().idle().await;
        self.service.shutdown();
        match self.notifier.failures() {
            0 => Ok(()),
            n => anyhow::bail!("{n} download(s) failed"),
        }
    }
}
