//! `plazmer save-blob <base64> <mime> <size>` – the page's bridge callback.

use anyhow::Result;
use plazmer_core::config::PlazmerConfig;

use super::Session;

pub async fn run_save_blob(cfg: PlazmerConfig, base64: &str, mime: &str, size: i64) -> Result<()> {
    let session = Session::start(cfg, true).await?;
    let job = session.service.bridge().save(base64, mime, size)?;
    tracing::debug!(job_id = job, "blob job queued");
    session.finish().await
}
