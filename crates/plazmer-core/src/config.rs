use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Offline cache parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache directory; defaults to `~/.cache/plazmer/web`.
    #[serde(default)]
    pub dir: Option<PathBuf>,
    /// Entries not accessed for this many days are evicted by the sweep.
    pub retention_days: u64,
    /// Interval between background sweeps, in seconds.
    pub sweep_interval_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: None,
            retention_days: 7,
            sweep_interval_secs: 3600,
        }
    }
}

impl CacheConfig {
    pub fn retention(&self) -> Duration {
        retention_days(self.retention_days)
    }
}

/// `days` as a duration; absurd values saturate instead of overflowing.
pub fn retention_days(days: u64) -> Duration {
    Duration::from_secs(days.saturating_mul(24 * 60 * 60))
}

/// Where finished downloads are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Destination {
    /// Shared "Downloads" directory, two-phase write.
    #[default]
    Public,
    /// Ask the host's save picker for every file.
    UserChosen,
}

/// How accepted non-blob downloads are fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectRoute {
    /// Network fetch inside the job queue.
    #[default]
    Queue,
    /// Hand off to the OS download manager, finalize on completion.
    System,
}

/// Global configuration loaded from `~/.config/plazmer/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlazmerConfig {
    /// Page loaded into the web view once the age gate passes.
    pub start_url: String,
    /// Public downloads directory; defaults to `~/Downloads`.
    #[serde(default)]
    pub downloads_dir: Option<PathBuf>,
    /// Where the OS download manager stages files before they are finalized;
    /// defaults to `~/.cache/plazmer/staging`.
    #[serde(default)]
    pub staging_dir: Option<PathBuf>,
    #[serde(default)]
    pub destination: Destination,
    #[serde(default)]
    pub direct_route: DirectRoute,
    /// URL path extensions treated as direct downloads (lowercase, no dot).
    pub download_extensions: Vec<String>,
    /// Hosts whose URLs are always treated as direct downloads.
    pub static_asset_hosts: Vec<String>,
    /// Title of the confirmation prompt.
    pub confirm_title: String,
    /// Name of the host object exposed to page scripts.
    pub bridge_name: String,
    /// User agent used when a request carries none.
    pub user_agent: String,
    /// Sampling interval for OS download manager progress.
    pub progress_poll_interval_ms: u64,
    #[serde(default)]
    pub cache: CacheConfig,
}

impl Default for PlazmerConfig {
    fn default() -> Self {
        Self {
            start_url: "https://mortonplazmer.wixsite.com/plazmerdi/".to_string(),
            downloads_dir: None,
            staging_dir: None,
            destination: Destination::Public,
            direct_route: DirectRoute::Queue,
            download_extensions: ["pdf", "doc", "docx", "xls", "xlsx"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            static_asset_hosts: vec!["static.wixstatic.com".to_string()],
            confirm_title: "Download file".to_string(),
            bridge_name: "AndroidBlob".to_string(),
            user_agent: concat!("plazmer/", env!("CARGO_PKG_VERSION")).to_string(),
            progress_poll_interval_ms: 500,
            cache: CacheConfig::default(),
        }
    }
}

impl PlazmerConfig {
    pub fn progress_poll_interval(&self) -> Duration {
        Duration::from_millis(self.progress_poll_interval_ms.max(1))
    }

    /// Resolved downloads directory (config value, else `$HOME/Downloads`).
    pub fn downloads_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.downloads_dir {
            return Ok(dir.clone());
        }
        let home = std::env::var_os("HOME")
            .map(PathBuf::from)
            .ok_or_else(|| anyhow::anyhow!("HOME is not set; configure downloads_dir"))?;
        Ok(home.join("Downloads"))
    }

    /// Resolved cache directory (config value, else XDG cache home).
    pub fn cache_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.cache.dir {
            return Ok(dir.clone());
        }
        let xdg_dirs = xdg::BaseDirectories::with_prefix("plazmer")?;
        Ok(xdg_dirs.get_cache_home().join("web"))
    }

    /// Resolved staging directory for OS-managed transfers.
    pub fn staging_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.staging_dir {
            return Ok(dir.clone());
        }
        let xdg_dirs = xdg::BaseDirectories::with_prefix("plazmer")?;
        Ok(xdg_dirs.get_cache_home().join("staging"))
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("plazmer")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<PlazmerConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = PlazmerConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: PlazmerConfig = toml::from_str(&data)?;
    Ok(cfg)
}
