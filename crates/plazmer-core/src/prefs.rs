//! Key-value preference store (`prefs.json` in the XDG state dir).
//!
//! The age gate writes `IsAdult`; the download core only reads it.

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

pub const IS_ADULT_KEY: &str = "IsAdult";

#[derive(Debug, Clone)]
pub struct Preferences {
    path: PathBuf,
    values: Map<String, Value>,
}

/// Default location: `~/.local/state/plazmer/prefs.json`.
pub fn prefs_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("plazmer")?;
    Ok(xdg_dirs.get_state_home().join("prefs.json"))
}

impl Preferences {
    /// Load from `path`; a missing file is an empty store.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(data) if data.trim().is_empty() => Map::new(),
            Ok(data) => serde_json::from_str(&data)
                .with_context(|| format!("invalid preferences file: {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(e) => {
                return Err(e).with_context(|| format!("read preferences: {}", path.display()))
            }
        };
        Ok(Self { path, values })
    }

    pub fn load_default() -> Result<Self> {
        Self::load(prefs_path()?)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.values.get(key).and_then(Value::as_bool).unwrap_or(default)
    }

    /// Set and persist.
    pub fn set_bool(&mut self, key: &str, value: bool) -> Result<()> {
        self.values.insert(key.to_string(), Value::Bool(value));
        self.save()
    }

    pub fn is_adult(&self) -> bool {
        self.get_bool(IS_ADULT_KEY, false)
    }

    /// Web content (and with it every download) is gated on the age answer.
    pub fn content_allowed(&self) -> bool {
        self.is_adult()
    }

    fn save(&self) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let data = serde_json::to_string_pretty(&self.values)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, data).with_context(|| format!("write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("replace {}", self.path.display()))?;
        Ok(())
    }
}
