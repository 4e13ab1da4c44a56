//! Age-based eviction. Best effort: nothing here fails the caller.

use std::path::Path;
use std::time::{Duration, SystemTime};

/// Outcome of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub removed: usize,
    pub kept: usize,
    /// Files that could not be inspected or deleted (logged, skipped).
    pub failed: usize,
}

pub(super) async fn sweep_dir(dir: &Path, retention: Duration, now: SystemTime) -> SweepReport {
    let mut report = SweepReport::default();
    let threshold = now.checked_sub(retention).unwrap_or(SystemTime::UNIX_EPOCH);

    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(dir = %dir.display(), "cache sweep skipped: {}", e);
            return report;
        }
    };

    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(dir = %dir.display(), "cache sweep stopped listing: {}", e);
                report.failed += 1;
                break;
            }
        };
        let path = entry.path();

        let modified = match entry.metadata().await.and_then(|m| {
            if m.is_file() {
                m.modified().map(Some)
            } else {
                Ok(None)
            }
        }) {
            Ok(Some(t)) => t,
            Ok(None) => continue,
            Err(e) => {
                tracing::warn!(path = %path.display(), "cache sweep: stat failed: {}", e);
                report.failed += 1;
                continue;
            }
        };

        if modified >= threshold {
            report.kept += 1;
            continue;
        }

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "evicted cache entry");
                report.removed += 1;
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), "cache sweep: delete failed: {}", e);
                report.failed += 1;
            }
        }
    }

    report
}
