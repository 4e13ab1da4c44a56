//! Download interception: classify engine events, confirm with the user,
//! route accepted downloads.

mod classify;

pub use classify::{Classification, Classifier};

use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Handle;

use crate::bridge::BlobBridge;
use crate::fetch::Fetcher;
use crate::finalize::{Finalizer, Payload};
use crate::host::{ConfirmPrompt, SystemTransferId, WebContentHost};
use crate::queue::{DownloadQueue, JobId};
use crate::request::{is_blob_url, DownloadRequest};
use crate::storage;
use crate::system::SystemHandoff;
use crate::url_model::{blob_file_name, guess_file_name};

/// What the engine should do with a navigation it reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationPolicy {
    /// Let the engine load it.
    Allow,
    /// Suppress it; the core has taken over (or the user declined).
    Cancel,
}

/// Native "download started" event from the engine.
#[derive(Debug, Clone, Default)]
pub struct DownloadStart {
    pub url: String,
    pub user_agent: Option<String>,
    pub content_disposition: Option<String>,
    pub mime_type: Option<String>,
    /// Reported length; zero or negative means unknown.
    pub content_length: i64,
}

/// Outcome of one intercepted event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interception {
    /// Not a download; left to the engine.
    Ignored,
    /// User said no. Nothing else happened.
    Declined,
    /// Network job queued.
    Enqueued(JobId),
    /// Extraction script injected; the bridge callback will queue the job.
    BlobRequested,
    /// Handed to the OS download manager.
    Delegated(SystemTransferId),
    /// Refused before confirmation (e.g. not enough space).
    Refused(String),
}

/// Routing for accepted direct downloads.
pub(crate) enum DirectHandler {
    Queue(Arc<dyn Fetcher>),
    System(Arc<SystemHandoff>),
}

pub struct Interceptor {
    classifier: Classifier,
    confirm_title: String,
    user_agent: String,
    downloads_dir: PathBuf,
    prompt: Arc<dyn ConfirmPrompt>,
    host: Arc<dyn WebContentHost>,
    bridge: Arc<BlobBridge>,
    queue: DownloadQueue,
    finalizer: Arc<Finalizer>,
    direct: DirectHandler,
    runtime: Handle,
}

impl Interceptor {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        classifier: Classifier,
        confirm_title: String,
        user_agent: String,
        downloads_dir: PathBuf,
        prompt: Arc<dyn ConfirmPrompt>,
        host: Arc<dyn WebContentHost>,
        bridge: Arc<BlobBridge>,
        queue: DownloadQueue,
        finalizer: Arc<Finalizer>,
        direct: DirectHandler,
        runtime: Handle,
    ) -> Self {
        Self {
            classifier,
            confirm_title,
            user_agent,
            downloads_dir,
            prompt,
            host,
            bridge,
            queue,
            finalizer,
            direct,
            runtime,
        }
    }

    pub fn classify(&self, url: &str) -> Classification {
        self.classifier.classify(url)
    }

    /// Engine hook for navigations. Returns at once; candidates are confirmed
    /// and routed on a task of the service runtime. Callable from any thread.
    pub fn on_navigation_intercept(self: &Arc<Self>, url: &str) -> NavigationPolicy {
        if !self.classify(url).is_candidate() {
            return NavigationPolicy::Allow;
        }
        let this = Arc::clone(self);
        let url = url.to_string();
        self.runtime.spawn(async move {
            if let Err(e) = this.handle_navigation(&url).await {
                tracing::warn!(url = %url, "intercepted download failed: {:#}", e);
            }
        });
        NavigationPolicy::Cancel
    }

    /// Engine hook for native download-start events. Never blocks the caller;
    /// callable from any thread.
    pub fn on_download_start(self: &Arc<Self>, event: DownloadStart) {
        if event.url.is_empty() || is_blob_url(&event.url) {
            return;
        }
        let this = Arc::clone(self);
        self.runtime.spawn(async move {
            let url = event.url.clone();
            if let Err(e) = this.handle_download_start(event).await {
                tracing::warn!(url = %url, "download start failed: {:#}", e);
            }
        });
    }

    /// Full flow for one navigation: classify, confirm, route.
    pub async fn handle_navigation(&self, url: &str) -> Result<Interception> {
        match self.classify(url) {
            Classification::Ignorable => Ok(Interception::Ignored),
            Classification::BlobCandidate => {
                // Type is unknown until the page answers; the saved name gains its extension then.
                let name = blob_file_name("", &chrono::Local::now());
                if !self.confirm(&name).await {
                    return Ok(Interception::Declined);
                }
                self.bridge.extract(self.host.as_ref(), url)?;
                Ok(Interception::BlobRequested)
            }
            Classification::FileCandidate => {
                let request = DownloadRequest::from_url(url, None, None, &self.user_agent, None);
                self.confirm_and_route(request).await
            }
        }
    }

    /// Full flow for a native download-start event.
    pub async fn handle_download_start(&self, event: DownloadStart) -> Result<Interception> {
        if event.url.is_empty() || is_blob_url(&event.url) {
            return Ok(Interception::Ignored);
        }
        let name = guess_file_name(
            &event.url,
            event.content_disposition.as_deref(),
            event.mime_type.as_deref(),
        );
        let user_agent = event
            .user_agent
            .as_deref()
            .filter(|ua| !ua.is_empty())
            .unwrap_or(&self.user_agent);
        let expected = u64::try_from(event.content_length).ok().filter(|n| *n > 0);
        let request = DownloadRequest::named(
            &event.url,
            &name,
            event.mime_type.as_deref().unwrap_or_default(),
            user_agent,
            expected,
        );

        if let Some(needed) = request.expected_size() {
            if !storage::has_space(&self.downloads_dir, needed) {
                let msg = format!("not enough free space for {}", request.suggested_name());
                self.finalizer.report_failure(request.suggested_name(), &msg);
                return Ok(Interception::Refused(msg));
            }
        }
        self.confirm_and_route(request).await
    }

    async fn confirm_and_route(&self, request: DownloadRequest) -> Result<Interception> {
        if !self.confirm(request.suggested_name()).await {
            return Ok(Interception::Declined);
        }
        match &self.direct {
            DirectHandler::Queue(fetcher) => {
                let id = self.enqueue_network(request, Arc::clone(fetcher))?;
                Ok(Interception::Enqueued(id))
            }
            DirectHandler::System(handoff) => {
                let (id, _poller) = handoff.start(request).await?;
                Ok(Interception::Delegated(id))
            }
        }
    }

    async fn confirm(&self, name: &str) -> bool {
        let message = format!("Download file:\n{name}?");
        let accepted = self.prompt.confirm(&self.confirm_title, &message).await;
        if !accepted {
            tracing::debug!(name, "download declined");
        }
        accepted
    }

    fn enqueue_network(&self, request: DownloadRequest, fetcher: Arc<dyn Fetcher>) -> Result<JobId> {
        let finalizer = Arc::clone(&self.finalizer);
        let label = format!("fetch {}", request.suggested_name());
        let id = self.queue.enqueue(label, move || async move {
            let fetched = match fetcher.fetch(request.source_url(), request.user_agent()).await {
                Ok(fetched) => fetched,
                Err(e) => {
                    finalizer.report_failure(request.suggested_name(), &format!("{e:#}"));
                    return Err(e);
                }
            };
            // The server's Content-Type refines a name guessed without one.
            let request = match fetched.mime_type.as_deref() {
                Some(mime) if request.mime_type() == crate::url_model::DEFAULT_MIME => {
                    DownloadRequest::named(
                        request.source_url(),
                        request.suggested_name(),
                        mime,
                        request.user_agent(),
                        request.expected_size(),
                    )
                }
                _ => request,
            };
            finalizer
                .finalize(&request, Payload::Bytes(fetched.bytes))
                .await
                .map(|_| ())
        })?;
        Ok(id)
    }
}
