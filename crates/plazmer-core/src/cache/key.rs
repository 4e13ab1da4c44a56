//! Filesystem-safe cache keys.

use sha2::{Digest, Sha256};

/// Normalized form of `url` used for keying: parsed and re-serialized with the
/// fragment dropped (so `a.pdf#page=2` and `a.pdf` share an entry). Strings
/// that do not parse as URLs are keyed as-is after trimming.
pub fn normalize_url(url: &str) -> String {
    match url::Url::parse(url.trim()) {
        Ok(mut parsed) => {
            parsed.set_fragment(None);
            parsed.into()
        }
        Err(_) => url.trim().to_string(),
    }
}

/// File name for the entry of `url`: lowercase hex SHA-256 of the normalized URL.
pub fn cache_key(url: &str) -> String {
    hex::encode(Sha256::digest(normalize_url(url).as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragment_and_host_case_do_not_matter() {
        assert_eq!(
            cache_key("https://X.com/a.pdf#page=2"),
            cache_key("https://x.com/a.pdf")
        );
        assert_ne!(cache_key("https://x.com/a.pdf"), cache_key("https://x.com/b.pdf"));
    }

    #[test]
    fn key_is_hex_sha256() {
        let k = cache_key("https://x.com/");
        assert_eq!(k.len(), 64);
        assert!(k.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}
