//! Filesystem-safe filename sanitization.

/// Longest name accepted by common filesystems (ext4 NAME_MAX, NTFS).
const NAME_MAX: usize = 255;

/// Sanitizes a candidate filename for every platform the shell runs on.
///
/// - Replaces NUL, path separators, control chars and Windows-reserved
///   punctuation (`<>:"|?*`) with `_`
/// - Collapses runs of `_`
/// - Trims leading/trailing spaces, dots and underscores
/// - Truncates to 255 bytes on a char boundary
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        let bad = c.is_control() || matches!(c, '/' | '\\' | '<' | '>' | ':' | '"' | '|' | '?' | '*');
        let c = if bad { '_' } else { c };
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
    }

    let trimmed = out.trim_matches(|c: char| c == ' ' || c == '.' || c == '_');
    let mut end = trimmed.len().min(NAME_MAX);
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    trimmed[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_separators_and_reserved() {
        assert_eq!(sanitize_filename("a/b\\c.txt"), "a_b_c.txt");
        assert_eq!(sanitize_filename("q: \"what\"?.pdf"), "q_ _what_.pdf");
    }

    #[test]
    fn trims_dots_and_spaces() {
        assert_eq!(sanitize_filename("  ..  file.txt  ..  "), "file.txt");
    }

    #[test]
    fn control_chars_collapse() {
        assert_eq!(sanitize_filename("file\x00\x01name.txt"), "file_name.txt");
    }

    #[test]
    fn truncates_on_char_boundary() {
        let long = "ж".repeat(200);
        let s = sanitize_filename(&long);
        assert!(s.len() <= 255);
        assert!(s.chars().all(|c| c == 'ж'));
    }
}
