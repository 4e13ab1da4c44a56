//! `plazmer open <url>` – the web view's navigation hook, end to end.

use anyhow::Result;
use plazmer_core::config::PlazmerConfig;
use plazmer_core::intercept::Interception;

use super::Session;

pub async fn run_open(cfg: PlazmerConfig, url: &str, yes: bool) -> Result<()> {
    let session = Session::start(cfg, yes).await?;
    let outcome = session.service.interceptor().handle_navigation(url).await?;
    match &outcome {
        Interception::Ignored => println!("not a download; the page would load it"),
        Interception::Declined => println!("declined"),
        Interception::Enqueued(id) => tracing::debug!(job_id = id, "queued"),
        Interception::BlobRequested => {
            println!("blob URL: run the script above in the page, then `plazmer save-blob`")
        }
        Interception::Delegated(id) => println!("handed to OS download manager ({})", id.0),
        Interception::Refused(reason) => println!("refused: {reason}"),
    }
    session.finish().await
}
