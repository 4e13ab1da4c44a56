//! Single GET over libcurl, run on the blocking pool.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::str;
use std::time::Duration;

use super::{Fetched, Fetcher};
use crate::error::DownloadError;

/// Plain HTTP(S) fetcher. Follows redirects and sends the page's user agent.
#[derive(Debug, Clone)]
pub struct CurlFetcher {
    connect_timeout: Duration,
    timeout: Duration,
}

impl Default for CurlFetcher {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            timeout: Duration::from_secs(3600),
        }
    }
}

impl CurlFetcher {
    pub fn with_timeouts(connect_timeout: Duration, timeout: Duration) -> Self {
        Self {
            connect_timeout,
            timeout,
        }
    }

    fn fetch_blocking(&self, url: &str, user_agent: &str) -> Result<Fetched> {
        let mut easy = curl::easy::Easy::new();
        easy.url(url).context("invalid URL")?;
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        if !user_agent.is_empty() {
            easy.useragent(user_agent)?;
        }
        easy.connect_timeout(self.connect_timeout)?;
        easy.low_speed_limit(1024)?;
        easy.low_speed_time(Duration::from_secs(60))?;
        easy.timeout(self.timeout)?;

        let mut body = Vec::new();
        let mut content_type: Option<String> = None;
        {
            let mut transfer = easy.transfer();
            transfer.header_function(|line| {
                if let Ok(line) = str::from_utf8(line) {
                    if let Some((name, value)) = line.split_once(':') {
                        if name.trim().eq_ignore_ascii_case("content-type") {
                            // Last one wins across redirects.
                            content_type = Some(value.trim().to_string());
                        }
                    }
                }
                true
            })?;
            transfer.write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform().map_err(DownloadError::Transfer)?;
        }

        let status = easy.response_code().context("no response code")?;
        if !(200..300).contains(&status) {
            return Err(DownloadError::Http {
                url: url.to_string(),
                status,
            }
            .into());
        }

        Ok(Fetched {
            bytes: body,
            mime_type: content_type,
            from_cache: false,
        })
    }
}

#[async_trait]
impl Fetcher for CurlFetcher {
    async fn fetch(&self, url: &str, user_agent: &str) -> Result<Fetched> {
        let this = self.clone();
        let url_owned = url.to_string();
        let user_agent = user_agent.to_string();
        tokio::task::spawn_blocking(move || this.fetch_blocking(&url_owned, &user_agent))
            .await
            .context("fetch task failed")?
            .with_context(|| format!("GET {url}"))
    }
}
