//! Navigation classification: what, if anything, a URL means for downloads.

use crate::config::PlazmerConfig;
use crate::request::is_blob_url;
use crate::url_model::url_path_extension;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Ordinary navigation; the engine handles it.
    Ignorable,
    /// In-page `blob:` object; bytes must come through the bridge.
    BlobCandidate,
    /// Document or static asset to download directly.
    FileCandidate,
}

impl Classification {
    pub fn as_str(self) -> &'static str {
        match self {
            Classification::Ignorable => "ignorable",
            Classification::BlobCandidate => "blob",
            Classification::FileCandidate => "file",
        }
    }

    pub fn is_candidate(self) -> bool {
        self != Classification::Ignorable
    }
}

/// Rules: `blob:` scheme first, then document extension or static-asset host.
#[derive(Debug, Clone)]
pub struct Classifier {
    extensions: Vec<String>,
    static_hosts: Vec<String>,
}

impl Classifier {
    pub fn new<E, H>(extensions: E, static_hosts: H) -> Self
    where
        E: IntoIterator,
        E::Item: AsRef<str>,
        H: IntoIterator,
        H::Item: AsRef<str>,
    {
        let norm = |s: &str| s.trim().trim_start_matches('.').to_ascii_lowercase();
        Self {
            extensions: extensions.into_iter().map(|e| norm(e.as_ref())).collect(),
            static_hosts: static_hosts
                .into_iter()
                .map(|h| h.as_ref().trim().to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn from_config(cfg: &PlazmerConfig) -> Self {
        Self::new(&cfg.download_extensions, &cfg.static_asset_hosts)
    }

    pub fn classify(&self, url: &str) -> Classification {
        if is_blob_url(url) {
            return Classification::BlobCandidate;
        }
        let by_extension =
            url_path_extension(url).is_some_and(|ext| self.extensions.iter().any(|e| *e == ext));
        if by_extension || self.is_static_host(url) {
            return Classification::FileCandidate;
        }
        Classification::Ignorable
    }

    /// Exact host, `*.domain` wildcard, or any subdomain of a listed host.
    fn is_static_host(&self, url: &str) -> bool {
        let Some(host) = url::Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
        else {
            return false;
        };
        self.static_hosts.iter().any(|pattern| {
            let base = pattern.strip_prefix("*.").unwrap_or(pattern);
            host == base
                || host
                    .strip_suffix(base)
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::from_config(&PlazmerConfig::default())
    }
}
