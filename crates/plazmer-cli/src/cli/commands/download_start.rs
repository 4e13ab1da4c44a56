//! `plazmer download-start <url>` – replay a native download-start event.

use anyhow::Result;
use plazmer_core::config::PlazmerConfig;
use plazmer_core::intercept::{DownloadStart, Interception};

use super::Session;

pub async fn run_download_start(cfg: PlazmerConfig, event: DownloadStart, yes: bool) -> Result<()> {
    let session = Session::start(cfg, yes).await?;
    match session.service.interceptor().handle_download_start(event).await? {
        Interception::Ignored => println!("ignored (blob and empty URLs arrive via navigation)"),
        Interception::Declined => println!("declined"),
        other => tracing::debug!(outcome = ?other, "download start handled"),
    }
    session.finish().await
}
