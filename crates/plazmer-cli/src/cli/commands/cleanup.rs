//! `plazmer cleanup` – drop leftovers of interrupted runs.

use anyhow::Result;
use plazmer_core::config::PlazmerConfig;
use plazmer_core::finalize::DownloadsDir;

pub fn run_cleanup(cfg: &PlazmerConfig) -> Result<()> {
    let downloads = DownloadsDir::new(cfg.downloads_dir()?);
    let pending = downloads.cleanup_pending();

    let staging_dir = cfg.staging_dir()?;
    let mut staged = 0usize;
    if let Ok(entries) = std::fs::read_dir(&staging_dir) {
        for path in entries.flatten().map(|e| e.path()).filter(|p| p.is_file()) {
            match std::fs::remove_file(&path) {
                Ok(()) => staged += 1,
                Err(e) => tracing::warn!(path = %path.display(), "failed to remove staged file: {}", e),
            }
        }
    }

    println!("Removed {pending} pending download(s) and {staged} staged file(s).");
    Ok(())
}
