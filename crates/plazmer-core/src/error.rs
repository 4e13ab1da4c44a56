//! Typed errors surfaced by the download subsystem.
//!
//! Job bodies work in `anyhow::Result` and attach context; these variants are
//! the cases callers branch on (declined prompts are not errors and never
//! reach this type).

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// The queue was shut down; the job was not accepted.
    #[error("download queue is shut down")]
    QueueClosed,

    /// Free space known to be smaller than the advertised payload size.
    #[error("not enough free space: need {needed} bytes, {available} available")]
    InsufficientSpace { needed: u64, available: u64 },

    /// The page handed over a payload that is not valid base64.
    #[error("invalid blob payload: {0}")]
    InvalidBlobPayload(#[from] base64::DecodeError),

    /// HTTP response had a non-2xx status.
    #[error("GET {url} returned HTTP {status}")]
    Http { url: String, status: u32 },

    /// Curl reported a transfer error (timeout, connection, etc.).
    #[error("transfer failed: {0}")]
    Transfer(#[from] curl::Error),

    /// The OS download manager reported a failed transfer.
    #[error("system download failed: {0}")]
    SystemTransfer(String),

    /// Staged file to finalize is missing (e.g. OS manager removed it).
    #[error("staged file missing: {}", .0.display())]
    StagingMissing(PathBuf),

    /// Destination picker or window could not be resolved; nothing is written.
    #[error("save location unavailable")]
    PickerUnavailable,
}

impl DownloadError {
    /// Whether the error is a silent cancellation rather than a user-visible failure.
    pub fn is_silent(&self) -> bool {
        matches!(self, DownloadError::PickerUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        let e = DownloadError::InsufficientSpace {
            needed: 10,
            available: 4,
        };
        assert_eq!(
            e.to_string(),
            "not enough free space: need 10 bytes, 4 available"
        );
        let e = DownloadError::Http {
            url: "https://x.com/a.pdf".into(),
            status: 404,
        };
        assert_eq!(e.to_string(), "GET https://x.com/a.pdf returned HTTP 404");
    }

    #[test]
    fn picker_unavailable_is_silent() {
        assert!(DownloadError::PickerUnavailable.is_silent());
        assert!(!DownloadError::QueueClosed.is_silent());
    }
}
