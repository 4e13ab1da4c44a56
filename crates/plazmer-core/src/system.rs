//! Hand-off to the OS download manager.
//!
//! The manager fetches into a staging file; a poll task samples its status at
//! a fixed interval and, once the transfer succeeds, queues a job that moves
//! the staged file into permanent storage.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::error::DownloadError;
use crate::finalize::{Finalizer, Payload};
use crate::host::{SystemDownloader, SystemTransferId, TransferStatus};
use crate::queue::DownloadQueue;
use crate::request::DownloadRequest;

pub struct SystemHandoff {
    downloader: Arc<dyn SystemDownloader>,
    queue: DownloadQueue,
    finalizer: Arc<Finalizer>,
    staging_dir: PathBuf,
    poll_interval: Duration,
    seq: AtomicU64,
}

impl SystemHandoff {
    pub fn new(
        downloader: Arc<dyn SystemDownloader>,
        queue: DownloadQueue,
        finalizer: Arc<Finalizer>,
        staging_dir: impl Into<PathBuf>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            downloader,
            queue,
            finalizer,
            staging_dir: staging_dir.into(),
            poll_interval,
            seq: AtomicU64::new(0),
        }
    }

    /// Start the OS transfer and spawn its progress poller.
    pub async fn start(&self, request: DownloadRequest) -> Result<(SystemTransferId, JoinHandle<()>)> {
        tokio::fs::create_dir_all(&self.staging_dir)
            .await
            .with_context(|| format!("create staging dir: {}", self.staging_dir.display()))?;
        let staging = self.staging_dir.join(format!(
            "{}.{}.{}",
            std::process::id(),
            self.seq.fetch_add(1, Ordering::Relaxed),
            request.suggested_name()
        ));

        let id = self
            .downloader
            .enqueue(&request, &staging)
            .await
            .context("OS download manager refused the request")?;
        tracing::info!(
            transfer = id.0,
            name = %request.suggested_name(),
            url = %request.source_url(),
            "handed download to OS manager"
        );

        let downloader = Arc::clone(&self.downloader);
        let queue = self.queue.clone();
        let finalizer = Arc::clone(&self.finalizer);
        let interval = self.poll_interval;
        let poller = tokio::spawn(async move {
            let status = poll_until_done(downloader.as_ref(), id, interval).await;
            let name = request.suggested_name().to_string();
            match status {
                TransferStatus::Succeeded => {
                    let staged = staging.clone();
                    let queued = queue.enqueue(format!("staged {name}"), move || async move {
                        finalizer
                            .finalize(&request, Payload::Staged(staged))
                            .await
                            .map(|_| ())
                    });
                    if let Err(e) = queued {
                        tracing::warn!(transfer = id.0, "staged download not finalized: {}", e);
                        let _ = tokio::fs::remove_file(&staging).await;
                    }
                }
                TransferStatus::Failed(msg) => {
                    let err = DownloadError::SystemTransfer(msg);
                    finalizer.report_failure(&name, &err.to_string());
                    let _ = tokio::fs::remove_file(&staging).await;
                }
                TransferStatus::Pending | TransferStatus::Running { .. } => {}
            }
        });
        Ok((id, poller))
    }
}

/// Sample `id` every `interval` until it reaches a terminal status.
/// A failing status query ends the loop as a failed transfer.
pub async fn poll_until_done(
    downloader: &dyn SystemDownloader,
    id: SystemTransferId,
    interval: Duration,
) -> TransferStatus {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let status = match downloader.status(id).await {
            Ok(status) => status,
            Err(e) => TransferStatus::Failed(format!("status query failed: {e:#}")),
        };
        match &status {
            TransferStatus::Running { bytes, total } => {
                let percent = total
                    .filter(|t| *t > 0)
                    .map(|t| (*bytes as f64 / t as f64) * 100.0);
                tracing::debug!(transfer = id.0, bytes, ?total, ?percent, "OS download progress");
            }
            TransferStatus::Pending => tracing::trace!(transfer = id.0, "OS download pending"),
            TransferStatus::Succeeded => tracing::info!(transfer = id.0, "OS download finished"),
            TransferStatus::Failed(msg) => tracing::warn!(transfer = id.0, "OS download failed: {}", msg),
        }
        if status.is_terminal() {
            return status;
        }
    }
}
