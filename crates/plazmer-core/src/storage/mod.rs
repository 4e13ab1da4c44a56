//! Disk I/O and file lifecycle.
//!
//! Downloads are written under a `.part` name and atomically renamed onto the
//! final name once complete and synced, so nothing ever observes a partial
//! file under its finished name.

mod writer;

pub use writer::PendingFile;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Path for the temp file: appends `.part` to the final path (e.g. `report.pdf` → `report.pdf.part`).
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}

pub fn is_pending(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(TEMP_SUFFIX))
}

/// First free name in `dir` for `name`: `name`, then `stem (1).ext`, `stem (2).ext`, ...
/// A name counts as taken when either it or its `.part` reservation exists.
pub fn unique_destination(dir: &Path, name: &str) -> PathBuf {
    let taken = |p: &Path| p.exists() || temp_path(p).exists();
    let first = dir.join(name);
    if !taken(&first) {
        return first;
    }
    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    };
    (1u32..)
        .map(|n| match ext {
            Some(ext) => dir.join(format!("{stem} ({n}).{ext}")),
            None => dir.join(format!("{stem} ({n})")),
        })
        .find(|p| !taken(p))
        .unwrap_or(first)
}

/// Finished (non-pending) regular files in `dir`, sorted by name.
pub fn list_finished(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("list {}", dir.display()))? {
        let path = entry?.path();
        if path.is_file() && !is_pending(&path) {
            out.push(path);
        }
    }
    out.sort();
    Ok(out)
}

/// Delete leftover `.part` files (from a crash or abandoned job). Returns how many were removed.
pub fn cleanup_pending(dir: &Path) -> usize {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return 0;
    };
    let mut removed = 0;
    for path in entries.flatten().map(|e| e.path()) {
        if !is_pending(&path) {
            continue;
        }
        match std::fs::remove_file(&path) {
            Ok(()) => removed += 1,
            Err(e) => tracing::warn!(path = %path.display(), "failed to remove stale pending file: {}", e),
        }
    }
    removed
}

/// Free bytes available to unprivileged writers on the filesystem holding
/// `path` (or its nearest existing ancestor, so a not-yet-created downloads
/// dir still answers). `None` when unknown; callers then skip the pre-check.
#[cfg(unix)]
pub fn available_space(path: &Path) -> Option<u64> {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let path = path.ancestors().find(|p| p.exists())?;
    let c_path = CString::new(path.as_os_str().as_bytes()).ok()?;
    let mut stat: libc::statvfs = unsafe { std::mem::zeroed() };
    let r = unsafe { libc::statvfs(c_path.as_ptr(), &mut stat) };
    if r != 0 {
        return None;
    }
    Some((stat.f_bavail as u64).saturating_mul(stat.f_frsize as u64))
}

#[cfg(not(unix))]
pub fn available_space(_path: &Path) -> Option<u64> {
    None
}

/// Whether `needed` bytes are known to fit. Unknown space counts as enough.
pub fn has_space(path: &Path, needed: u64) -> bool {
    match available_space(path) {
        Some(free) => free > needed,
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_path_appends_part() {
        let p = temp_path(Path::new("report.pdf"));
        assert_eq!(p.to_string_lossy(), "report.pdf.part");
        assert!(is_pending(&p));
        assert!(!is_pending(Path::new("report.pdf")));
    }

    #[test]
    fn reserve_write_publish() {
        let dir = tempfile::tempdir().unwrap();
        let final_path = dir.path().join("out.txt");

        let mut pending = PendingFile::reserve(&final_path).unwrap();
        pending.preallocate(64).unwrap();
        pending.write_all(b"hello ").unwrap();
        pending.write_all(b"world").unwrap();
        assert!(pending.temp_path().exists());
        assert!(!final_path.exists());
        assert!(list_finished(dir.path()).unwrap().is_empty());

        let published = pending.publish().unwrap();
        assert_eq!(published, final_path);
        assert_eq!(std::fs::read(&final_path).unwrap(), b"hello world");
        assert!(!temp_path(&final_path).exists());
        assert_eq!(list_finished(dir.path()).unwrap(), vec![final_path]);
    }

    #[test]
    fn discard_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let final_path = dir.path().join("x.bin");
        let mut pending = PendingFile::reserve(&final_path).unwrap();
        pending.write_all(b"partial").unwrap();
        pending.discard();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn unique_destination_skips_taken_and_reserved() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(unique_destination(dir.path(), "a.pdf"), dir.path().join("a.pdf"));
        std::fs::write(dir.path().join("a.pdf"), b"").unwrap();
        std::fs::write(dir.path().join("a (1).pdf.part"), b"").unwrap();
        assert_eq!(unique_destination(dir.path(), "a.pdf"), dir.path().join("a (2).pdf"));
        std::fs::write(dir.path().join("README"), b"").unwrap();
        assert_eq!(unique_destination(dir.path(), "README"), dir.path().join("README (1)"));
    }

    #[test]
    fn cleanup_pending_removes_only_part_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("done.pdf"), b"x").unwrap();
        std::fs::write(dir.path().join("half.pdf.part"), b"x").unwrap();
        assert_eq!(cleanup_pending(dir.path()), 1);
        assert!(dir.path().join("done.pdf").exists());
        assert!(!dir.path().join("half.pdf.part").exists());
    }

    #[cfg(unix)]
    #[test]
    fn available_space_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        assert!(available_space(dir.path()).is_some());
        assert!(has_space(dir.path(), 1));
        assert!(!has_space(dir.path(), u64::MAX));
    }
}
