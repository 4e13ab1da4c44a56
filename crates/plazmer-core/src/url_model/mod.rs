//! URL modeling and filename derivation.
//!
//! Derives safe local filenames from Content-Disposition, the URL path or the
//! MIME type, and names blob payloads that carry no URL path at all.

mod content_disposition;
mod mime;
mod path;
mod sanitize;

pub use content_disposition::parse_content_disposition_filename;
pub use mime::{extension_for_mime, mime_for_extension, normalize_mime, DEFAULT_MIME};
pub use path::{filename_from_url_path, url_path_extension};
pub use sanitize::sanitize_filename;

use chrono::{DateTime, TimeZone};

/// Stem used when neither header nor URL yields a usable name.
const DEFAULT_STEM: &str = "download";

/// Guesses a safe filename for a download.
///
/// Prefers `content_disposition`, then the last URL path segment. When the
/// candidate has no extension and `mime` maps to one, the extension is
/// appended. Nothing usable falls back to `download.<ext>` (or `download.bin`).
///
/// - `guess_file_name("https://x.com/a/report.pdf", None, None)` → `"report.pdf"`
/// - `guess_file_name("https://x.com/get?id=4", None, Some("application/pdf"))` → `"get.pdf"`
pub fn guess_file_name(url: &str, content_disposition: Option<&str>, mime: Option<&str>) -> String {
    let candidate = content_disposition
        .and_then(parse_content_disposition_filename)
        .or_else(|| filename_from_url_path(url))
        .map(|raw| sanitize_filename(&raw))
        .filter(|s| !s.is_empty());

    let mime_ext = mime.and_then(extension_for_mime);

    match candidate {
        Some(name) if has_extension(&name) => name,
        Some(name) => match mime_ext {
            Some(ext) => format!("{name}.{ext}"),
            None => name,
        },
        None => format!("{DEFAULT_STEM}.{}", mime_ext.unwrap_or("bin")),
    }
}

/// Name for a payload pulled out of a `blob:` URL: `blob_<yyyyMMdd_HHmmss>[.<ext>]`.
pub fn blob_file_name<Tz: TimeZone>(mime: &str, at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let stamp = at.format("%Y%m%d_%H%M%S");
    match extension_for_mime(mime) {
        Some(ext) => format!("blob_{stamp}.{ext}"),
        None => format!("blob_{stamp}"),
    }
}

fn has_extension(name: &str) -> bool {
    matches!(name.rsplit_once('.'), Some((stem, ext)) if !stem.is_empty() && !ext.is_empty())
}
