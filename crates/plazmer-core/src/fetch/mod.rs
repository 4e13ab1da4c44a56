//! Network byte sources for direct downloads, with offline cache fallback.

mod http;

pub use http::CurlFetcher;

use anyhow::Result;
use async_trait::async_trait;

use crate::cache::DiskCache;

/// Body of a fetched resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched {
    pub bytes: Vec<u8>,
    /// Content-Type reported by the server (or stored with the cache entry).
    pub mime_type: Option<String>,
    pub from_cache: bool,
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str, user_agent: &str) -> Result<Fetched>;
}

#[async_trait]
impl<T: Fetcher + ?Sized> Fetcher for std::sync::Arc<T> {
    async fn fetch(&self, url: &str, user_agent: &str) -> Result<Fetched> {
        (**self).fetch(url, user_agent).await
    }
}

/// Wraps a fetcher: successful bodies are written to the cache, and when the
/// network fails a cached copy (if any) is served instead.
pub struct CachedFetcher<F> {
    inner: F,
    cache: DiskCache,
}

impl<F: Fetcher> CachedFetcher<F> {
    pub fn new(inner: F, cache: DiskCache) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl<F: Fetcher> Fetcher for CachedFetcher<F> {
    async fn fetch(&self, url: &str, user_agent: &str) -> Result<Fetched> {
        match self.inner.fetch(url, user_agent).await {
            Ok(fetched) => {
                let mime = fetched
                    .mime_type
                    .as_deref()
                    .unwrap_or(crate::url_model::DEFAULT_MIME);
                if let Err(e) = self.cache.put(url, &fetched.bytes, mime).await {
                    tracing::warn!(url, "failed to cache response: {:#}", e);
                }
                Ok(fetched)
            }
            Err(err) => match self.cache.get(url).await {
                Ok(Some(entry)) => {
                    tracing::warn!(url, "network fetch failed, serving cached copy: {:#}", err);
                    Ok(Fetched {
                        bytes: entry.bytes,
                        mime_type: Some(entry.mime_type),
                        from_cache: true,
                    })
                }
                Ok(None) => Err(err),
                Err(cache_err) => {
                    tracing::warn!(url, "cache lookup failed: {:#}", cache_err);
                    Err(err)
                }
            },
        }
    }
}
