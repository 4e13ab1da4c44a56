//! Download requests.

use crate::url_model::{guess_file_name, normalize_mime, sanitize_filename};

/// One download attempt. Built at interception time and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    source_url: String,
    suggested_name: String,
    mime_type: String,
    user_agent: String,
    expected_size: Option<u64>,
}

impl DownloadRequest {
    /// Request for an ordinary URL; the name is guessed from the header, path and MIME.
    pub fn from_url(
        url: &str,
        content_disposition: Option<&str>,
        mime_type: Option<&str>,
        user_agent: &str,
        expected_size: Option<u64>,
    ) -> Self {
        let suggested_name = guess_file_name(url, content_disposition, mime_type);
        Self {
            source_url: url.to_string(),
            suggested_name,
            mime_type: normalize_mime(mime_type.unwrap_or_default()),
            user_agent: user_agent.to_string(),
            expected_size: expected_size.filter(|n| *n > 0),
        }
    }

    /// Request with an explicit name (blob payloads, staged OS downloads).
    pub fn named(
        url: &str,
        name: &str,
        mime_type: &str,
        user_agent: &str,
        expected_size: Option<u64>,
    ) -> Self {
        let mut suggested_name = sanitize_filename(name);
        if suggested_name.is_empty() {
            suggested_name = guess_file_name(url, None, Some(mime_type));
        }
        Self {
            source_url: url.to_string(),
            suggested_name,
            mime_type: normalize_mime(mime_type),
            user_agent: user_agent.to_string(),
            expected_size: expected_size.filter(|n| *n > 0),
        }
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn suggested_name(&self) -> &str {
        &self.suggested_name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Advertised size; `None` means unknown (no meaningful space pre-check).
    pub fn expected_size(&self) -> Option<u64> {
        self.expected_size
    }

    pub fn is_blob(&self) -> bool {
        is_blob_url(&self.source_url)
    }
}

pub fn is_blob_url(url: &str) -> bool {
    url.get(..5).is_some_and(|s| s.eq_ignore_ascii_case("blob:"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_url_derives_name_and_defaults_mime() {
        let r = DownloadRequest::from_url("https://x.com/a/report.pdf", None, None, "ua", Some(0));
        assert_eq!(r.suggested_name(), "report.pdf");
        assert_eq!(r.mime_type(), "application/octet-stream");
        assert_eq!(r.expected_size(), None);
        assert!(!r.is_blob());
    }

    #[test]
    fn named_sanitizes() {
        let r = DownloadRequest::named("blob:https://x.com/1", "a/b.txt", "text/plain", "ua", Some(5));
        assert_eq!(r.suggested_name(), "a_b.txt");
        assert_eq!(r.expected_size(), Some(5));
        assert!(r.is_blob());
    }

    #[test]
    fn blob_scheme_is_case_insensitive() {
        assert!(is_blob_url("BLOB:abcd"));
        assert!(!is_blob_url("blo"));
        assert!(!is_blob_url("https://blob.example.com/"));
    }
}
