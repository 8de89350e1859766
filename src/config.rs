use std::env;
use std::fs;
use std::path::PathBuf;

use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub const DATA_ROOT_ENV: &str = "ZC_INVOICE_DATA_ROOT";
pub const DEFAULT_DATA_ROOT: &str = "~/Documents/ZC";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    pub data_root: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            data_root: DEFAULT_DATA_ROOT.to_string(),
        }
    }
}

impl AppSettings {
    pub fn config_path() -> PathBuf {
        match ProjectDirs::from("com", "zc-invoice", "app") {
            Some(dirs) => dirs.config_dir().join("settings.toml"),
            None => PathBuf::from("settings.toml"),
        }
    }

    /// Saved settings, if any. An unreadable file counts as none.
    pub fn load() -> Option<Self> {
        let content = fs::read_to_string(Self::config_path()).ok()?;
        toml::from_str(&content).ok()
    }

    /// Env override first, then the settings file, then the default.
    pub fn resolve() -> Self {
        Self::resolve_with(env::var(DATA_ROOT_ENV).ok())
    }

    /// A blank override is ignored.
    fn resolve_with(env_root: Option<String>) -> Self {
        match env_root {
            Some(root) if !root.trim().is_empty() => Self { data_root: root },
            _ => Self::load().unwrap_or_default(),
        }
    }

    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_path();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(&path, toml::to_string_pretty(self)?)?;
        Ok(path)
    }

    pub fn data_root_path(&self) -> PathBuf {
        PathBuf::from(expand_home_dir(&self.data_root))
    }
}

pub fn expand_home_dir(path: &str) -> String {
    if path == "~" || path.starts_with("~/") {
        if let Some(base_dirs) = BaseDirs::new() {
            let home = base_dirs.home_dir().to_string_lossy();
            return path.replacen('~', &home, 1);
        }
    }
    path.to_string()
}
