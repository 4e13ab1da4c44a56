//! The download service: owns the cache, the queue and everything wired to
//! them. Built once at process start, shut down at process end.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::bridge::BlobBridge;
use crate::cache::DiskCache;
use crate::config::{DirectRoute, PlazmerConfig};
use crate::fetch::{CachedFetcher, CurlFetcher, Fetcher};
use crate::finalize::{DownloadsDir, Finalizer, PublicStore};
use crate::host::{ConfirmPrompt, SaveLocationPicker, SystemDownloader, WebContentHost};
use crate::intercept::{Classifier, DirectHandler, Interceptor};
use crate::notify::{FileOpener, LogNotifier, NoopOpener, Notifier};
use crate::queue::DownloadQueue;
use crate::system::SystemHandoff;

/// Platform collaborators handed to [`DownloadService::init`].
pub struct HostParts {
    pub host: Arc<dyn WebContentHost>,
    pub prompt: Arc<dyn ConfirmPrompt>,
    pub notifier: Arc<dyn Notifier>,
    pub opener: Arc<dyn FileOpener>,
    pub picker: Option<Arc<dyn SaveLocationPicker>>,
    pub system: Option<Arc<dyn SystemDownloader>>,
    /// Network source for direct downloads; libcurl when `None`. Always
    /// wrapped with the offline cache.
    pub fetcher: Option<Arc<dyn Fetcher>>,
    /// Public store override; the configured downloads dir when `None`.
    pub store: Option<Arc<dyn PublicStore>>,
}

impl HostParts {
    /// Minimal set: log-only notifications, no viewer, no picker, no OS manager.
    pub fn new(host: Arc<dyn WebContentHost>, prompt: Arc<dyn ConfirmPrompt>) -> Self {
        Self {
            host,
            prompt,
            notifier: Arc::new(LogNotifier),
            opener: Arc::new(NoopOpener),
            picker: None,
            system: None,
            fetcher: None,
            store: None,
        }
    }
}

pub struct DownloadService {
    config: PlazmerConfig,
    downloads: DownloadsDir,
    cache: DiskCache,
    queue: DownloadQueue,
    finalizer: Arc<Finalizer>,
    bridge: Arc<BlobBridge>,
    interceptor: Arc<Interceptor>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl DownloadService {
    /// Open the cache, start its periodic sweep, clear stale `.part` files and
    /// wire the queue, finalizer, bridge and interceptor together.
    ///
    /// Must be called from within a tokio runtime; jobs run on that runtime.
    pub async fn init(config: PlazmerConfig, parts: HostParts) -> Result<Self> {
        let downloads_dir = config.downloads_dir()?;
        let downloads = DownloadsDir::new(&downloads_dir);
        let stale = downloads.cleanup_pending();
        if stale > 0 {
            tracing::info!(count = stale, dir = %downloads_dir.display(), "removed stale pending downloads");
        }

        let cache = DiskCache::open(config.cache_dir()?)
            .await
            .context("failed to open offline cache")?;
        let sweeper = cache.spawn_periodic_sweep(
            config.cache.retention(),
            Duration::from_secs(config.cache.sweep_interval_secs.max(1)),
        );

        let runtime = Handle::current();
        let queue = DownloadQueue::new(runtime.clone());

        let store = parts
            .store
            .unwrap_or_else(|| Arc::new(downloads.clone()) as Arc<dyn PublicStore>);
        let mut finalizer = Finalizer::new(store, parts.notifier, parts.opener);
        if let Some(picker) = parts.picker {
            finalizer = finalizer.with_picker(picker);
        }
        let finalizer = Arc::new(finalizer.with_destination(config.destination));

        let bridge = Arc::new(BlobBridge::new(
            config.bridge_name.clone(),
            config.user_agent.clone(),
            downloads_dir.clone(),
            queue.clone(),
            Arc::clone(&finalizer),
        ));

        let direct = match (config.direct_route, parts.system) {
            (DirectRoute::System, Some(system)) => DirectHandler::System(Arc::new(SystemHandoff::new(
                system,
                queue.clone(),
                Arc::clone(&finalizer),
                config.staging_dir()?,
                config.progress_poll_interval(),
            ))),
            (route, _) => {
                if route == DirectRoute::System {
                    tracing::warn!("direct_route = system but the host has no OS download manager; using the queue");
                }
                let inner: Arc<dyn Fetcher> = parts
                    .fetcher
                    .unwrap_or_else(|| Arc::new(CurlFetcher::default()));
                DirectHandler::Queue(Arc::new(CachedFetcher::new(inner, cache.clone())))
            }
        };

        let interceptor = Arc::new(Interceptor::new(
            Classifier::from_config(&config),
            config.confirm_title.clone(),
            config.user_agent.clone(),
            downloads_dir.clone(),
            parts.prompt,
            parts.host,
            Arc::clone(&bridge),
            queue.clone(),
            Arc::clone(&finalizer),
            direct,
            runtime,
        ));

        tracing::info!(
            downloads = %downloads_dir.display(),
            cache = %cache.dir().display(),
            route = ?config.direct_route,
            destination = ?config.destination,
            "download service ready"
        );

        Ok(Self {
            config,
            downloads,
            cache,
            queue,
            finalizer,
            bridge,
            interceptor,
            sweeper: Mutex::new(Some(sweeper)),
        })
    }

    pub fn config(&self) -> &PlazmerConfig {
        &self.config
    }

    pub fn downloads_dir(&self) -> &Path {
        self.downloads.dir()
    }

    /// Finished files in the downloads dir.
    pub fn finished_downloads(&self) -> Result<Vec<PathBuf>> {
        self.downloads.list_finished()
    }

    pub fn cache(&self) -> &DiskCache {
        &self.cache
    }

    pub fn queue(&self) -> &DownloadQueue {
        &self.queue
    }

    pub fn finalizer(&self) -> &Arc<Finalizer> {
        &self.finalizer
    }

    /// Target for the page's `save`/`error` callbacks.
    pub fn bridge(&self) -> &Arc<BlobBridge> {
        &self.bridge
    }

    /// Target for the engine's navigation and download-start hooks.
    pub fn interceptor(&self) -> &Arc<Interceptor> {
        &self.interceptor
    }

    /// Stop accepting jobs, abandon queued and running ones, stop the sweep.
    pub fn shutdown(&self) {
        self.queue.shutdown();
        let sweeper = self
            .sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = sweeper {
            handle.abort();
        }
        tracing::info!("download service stopped");
    }
}

impl Drop for DownloadService {
    fn drop(&mut self) {
        if let Some(handle) = self
            .sweeper
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
        }
    }
}
