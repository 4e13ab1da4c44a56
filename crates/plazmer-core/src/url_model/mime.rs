//! MIME type ↔ file extension lookups for the document types the shell serves.

/// MIME used when the engine reports none.
pub const DEFAULT_MIME: &str = "application/octet-stream";

const TABLE: &[(&str, &str)] = &[
    ("application/pdf", "pdf"),
    ("application/msword", "doc"),
    (
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "docx",
    ),
    ("application/vnd.ms-excel", "xls"),
    (
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "xlsx",
    ),
    ("application/zip", "zip"),
    ("application/vnd.android.package-archive", "apk"),
    ("application/json", "json"),
    ("text/plain", "txt"),
    ("text/csv", "csv"),
    ("text/html", "html"),
    ("image/png", "png"),
    ("image/jpeg", "jpg"),
    ("image/gif", "gif"),
    ("image/webp", "webp"),
    ("image/svg+xml", "svg"),
    ("audio/mpeg", "mp3"),
    ("video/mp4", "mp4"),
];

/// Strip parameters (`; charset=...`), trim and lowercase; empty becomes [`DEFAULT_MIME`].
pub fn normalize_mime(mime: &str) -> String {
    let essence = mime.split(';').next().unwrap_or("").trim();
    if essence.is_empty() {
        DEFAULT_MIME.to_string()
    } else {
        essence.to_ascii_lowercase()
    }
}

pub fn extension_for_mime(mime: &str) -> Option<&'static str> {
    let mime = normalize_mime(mime);
    TABLE.iter().find(|(m, _)| *m == mime).map(|(_, ext)| *ext)
}

pub fn mime_for_extension(ext: &str) -> Option<&'static str> {
    TABLE
        .iter()
        .find(|(_, e)| e.eq_ignore_ascii_case(ext))
        .map(|(m, _)| *m)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups() {
        assert_eq!(extension_for_mime("text/plain; charset=utf-8"), Some("txt"));
        assert_eq!(extension_for_mime("APPLICATION/PDF"), Some("pdf"));
        assert_eq!(extension_for_mime("application/x-unknown"), None);
        assert_eq!(mime_for_extension("XLSX"), TABLE.get(4).map(|(m, _)| *m));
    }

    #[test]
    fn empty_mime_defaults() {
        assert_eq!(normalize_mime("  "), DEFAULT_MIME);
    }
}
