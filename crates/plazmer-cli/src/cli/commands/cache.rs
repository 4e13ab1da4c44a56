//! `plazmer cache get|put|sweep` – offline cache maintenance.

use anyhow::{Context, Result};
use plazmer_core::cache::DiskCache;
use plazmer_core::config::{self, PlazmerConfig};
use plazmer_core::url_model::{mime_for_extension, DEFAULT_MIME};
use std::path::Path;

use crate::cli::CacheAction;

pub async fn run_cache(cfg: &PlazmerConfig, action: CacheAction) -> Result<()> {
    let cache = DiskCache::open(cfg.cache_dir()?).await?;
    match action {
        CacheAction::Get { url, output } => match cache.get(&url).await? {
            Some(entry) => match output {
                Some(path) => {
                    tokio::fs::write(&path, &entry.bytes)
                        .await
                        .with_context(|| format!("write {path}"))?;
                    println!("{} bytes ({}) -> {}", entry.bytes.len(), entry.mime_type, path);
                }
                None => println!(
                    "{} bytes ({}) at {}",
                    entry.bytes.len(),
                    entry.mime_type,
                    cache.entry_path(&url).display()
                ),
            },
            None => println!("not cached: {url}"),
        },
        CacheAction::Put { url, path, mime } => {
            let bytes = tokio::fs::read(&path)
                .await
                .with_context(|| format!("read {path}"))?;
            let mime = mime.unwrap_or_else(|| guess_mime(Path::new(&path)).to_string());
            cache.put(&url, &bytes, &mime).await?;
            println!("cached {} bytes ({}) for {}", bytes.len(), mime, url);
        }
        CacheAction::Sweep { days } => {
            let retention = days
                .map(config::retention_days)
                .unwrap_or_else(|| cfg.cache.retention());
            let report = cache.sweep(retention).await;
            println!(
                "removed {}, kept {}, failed {}",
                report.removed, report.kept, report.failed
            );
        }
    }
    Ok(())
}

fn guess_mime(path: &Path) -> &'static str {
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(mime_for_extension)
        .unwrap_or(DEFAULT_MIME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_from_extension() {
        assert_eq!(guess_mime(Path::new("/tmp/a.PDF")), "application/pdf");
        assert_eq!(guess_mime(Path::new("/tmp/noext")), DEFAULT_MIME);
    }
}
