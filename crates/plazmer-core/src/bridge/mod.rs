//! Host↔page channel for `blob:` downloads.
//!
//! The host injects [`blob_extraction_script`] into the page; the page calls
//! back into [`BlobBridge::save`] or [`BlobBridge::error`]. Callbacks never
//! write inline: `save` decodes and hands the bytes to the job queue.

mod script;

pub use script::blob_extraction_script;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::DownloadError;
use crate::finalize::{Finalizer, Payload};
use crate::host::WebContentHost;
use crate::queue::{DownloadQueue, JobId};
use crate::request::DownloadRequest;
use crate::storage;
use crate::url_model::blob_file_name;

pub struct BlobBridge {
    bridge_name: String,
    user_agent: String,
    downloads_dir: PathBuf,
    queue: DownloadQueue,
    finalizer: Arc<Finalizer>,
}

impl BlobBridge {
    pub fn new(
        bridge_name: impl Into<String>,
        user_agent: impl Into<String>,
        downloads_dir: impl Into<PathBuf>,
        queue: DownloadQueue,
        finalizer: Arc<Finalizer>,
    ) -> Self {
        Self {
            bridge_name: bridge_name.into(),
            user_agent: user_agent.into(),
            downloads_dir: downloads_dir.into(),
            queue,
            finalizer,
        }
    }

    /// Name of the object page scripts call (`<name>.save`, `<name>.error`).
    pub fn name(&self) -> &str {
        &self.bridge_name
    }

    /// Ask the page to hand over the bytes behind `blob_url`.
    pub fn extract(&self, host: &dyn WebContentHost, blob_url: &str) -> anyhow::Result<()> {
        tracing::debug!(url = blob_url, "injecting blob extraction script");
        host.inject_script(&blob_extraction_script(blob_url, &self.bridge_name))
    }

    /// Page callback: base64 payload, its MIME type and the page-reported size.
    ///
    /// `size` only drives an advisory free-space check; when space is known to
    /// be short no job is created. Errors are logged here as well as returned,
    /// so adapters may ignore the result.
    pub fn save(&self, base64: &str, mime_type: &str, size: i64) -> Result<JobId, DownloadError> {
        let result = self.try_save(base64, mime_type, size);
        if let Err(e) = &result {
            tracing::error!(mime = mime_type, size, "blob save refused: {}", e);
        }
        result
    }

    fn try_save(&self, base64: &str, mime_type: &str, size: i64) -> Result<JobId, DownloadError> {
        let needed = u64::try_from(size).unwrap_or(0);
        if needed > 0 {
            if let Some(available) = storage::available_space(&self.downloads_dir) {
                if available <= needed {
                    return Err(DownloadError::InsufficientSpace { needed, available });
                }
            }
        }

        let bytes = STANDARD.decode(base64.trim())?;
        let name = blob_file_name(mime_type, &chrono::Local::now());
        let request = DownloadRequest::named(
            &format!("blob:{name}"),
            &name,
            mime_type,
            &self.user_agent,
            Some(bytes.len() as u64),
        );
        tracing::info!(name = %request.suggested_name(), bytes = bytes.len(), "blob payload received");

        let finalizer = Arc::clone(&self.finalizer);
        self.queue
            .enqueue(format!("blob {}", request.suggested_name()), move || async move {
                finalizer
                    .finalize(&request, Payload::Bytes(bytes))
                    .await
                    .map(|_| ())
            })
    }

    /// Page callback for a script failure. Logged only.
    pub fn error(&self, message: &str) {
        tracing::error!("blob extraction failed in page: {}", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finalize::DownloadsDir;
    use crate::notify::{NoopOpener, NotificationId, Notifier, OpenAction};
    use std::sync::Mutex;
    use tokio::runtime::Handle;

    #[derive(Default)]
    struct Completed(Mutex<Vec<OpenAction>>);

    impl Notifier for Completed {
        fn started(&self, _id: NotificationId, _name: &str) {}
        fn completed(&self, _id: NotificationId, _name: &str, open: &OpenAction) {
            self.0.lock().unwrap().push(open.clone());
        }
        fn error(&self, _id: NotificationId, message: &str) {
            panic!("unexpected error notification: {message}");
        }
    }

    struct Captured(Mutex<Vec<String>>);

    impl WebContentHost for Captured {
        fn inject_script(&self, script: &str) -> anyhow::Result<()> {
            self.0.lock().unwrap().push(script.to_string());
            Ok(())
        }
    }

    fn bridge(dir: &std::path::Path, notifier: Arc<Completed>) -> (BlobBridge, DownloadQueue) {
        let queue = DownloadQueue::new(Handle::current());
        let finalizer = Arc::new(Finalizer::new(
            Arc::new(DownloadsDir::new(dir)),
            notifier,
            Arc::new(NoopOpener),
        ));
        let bridge = BlobBridge::new("AndroidBlob", "ua", dir, queue.clone(), finalizer);
        (bridge, queue)
    }

    #[tokio::test]
    async fn save_enqueues_one_job_with_decoded_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let notifier = Arc::new(Completed::default());
        let (bridge, queue) = bridge(dir.path(), notifier.clone());

        bridge.save("aGVsbG8=", "text/plain", 5).unwrap();
        queue.idle().await;

        let done = notifier.0.lock().unwrap();
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].mime_type, "text/plain");
        assert_eq!(std::fs::read(&done[0].path).unwrap(), b"hello");
        let name = done[0].path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("blob_") && name.ends_with(".txt"), "{name}");
    }

    #[tokio::test]
    async fn invalid_base64_creates_no_job() {
        let dir = tempfile::tempdir().unwrap();
        let (bridge, queue) = bridge(dir.path(), Arc::new(Completed::default()));
        let mut events = queue.subscribe();

        let err = bridge.save("***", "text/plain", 3).unwrap_err();
        assert!(matches!(err, DownloadError::InvalidBlobPayload(_)));
        assert!(events.try_recv().is_err());
        assert!(queue.is_idle());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn absurd_size_is_refused_before_decoding() {
        let dir = tempfile::tempdir().unwrap();
        let (bridge, queue) = bridge(dir.path(), Arc::new(Completed::default()));

        let err = bridge.save("aGVsbG8=", "text/plain", i64::MAX).unwrap_err();
        assert!(matches!(err, DownloadError::InsufficientSpace { .. }));
        assert!(queue.is_idle());
    }

    #[tokio::test]
    async fn extract_injects_script_for_url() {
        let dir = tempfile::tempdir().unwrap();
        let (bridge, _queue) = bridge(dir.path(), Arc::new(Completed::default()));
        let host = Captured(Mutex::new(Vec::new()));

        bridge.extract(&host, "blob:https://x.com/abcd").unwrap();
        bridge.error("TypeError: Failed to fetch");

        let scripts = host.0.lock().unwrap();
        assert_eq!(scripts.len(), 1);
        assert!(scripts[0].contains("blob:https://x.com/abcd"));
    }
}
