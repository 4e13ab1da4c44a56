pub mod config;
pub mod error;
pub mod logging;

pub mod bridge;
pub mod cache;
pub mod fetch;
pub mod finalize;
pub mod host;
pub mod intercept;
pub mod notify;
pub mod prefs;
pub mod queue;
pub mod request;
pub mod service;
pub mod storage;
pub mod system;
pub mod url_model;

pub use error::DownloadError;
pub use service::{DownloadService, HostParts};
