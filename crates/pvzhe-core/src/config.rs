//! Runtime configuration loaded from a TOML file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Default configuration file name
pub const CONFIG_FILE: &str = "pvzhe.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Substring of the game window title, matched case-insensitively
    pub window_title: String,
    /// The game's user data directory
    pub save_dir: PathBuf,
    /// Where timestamped backups are kept
    pub backup_dir: PathBuf,
    /// Number of backups retained by pruning
    pub keep_backups: usize,
    /// Auto-save period
    pub save_interval_secs: u64,
    /// Liveness refresh period
    pub poll_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window_title: "植物大战僵尸杂交版".to_string(),
            save_dir: PathBuf::from(r"C:\ProgramData\PopCap Games\PlantsVsZombies\pvzHE\yourdata"),
            backup_dir: PathBuf::from("backup"),
            keep_backups: 10,
            save_interval_secs: 30,
            poll_interval_ms: 500,
        }
    }
}

impl Config {
    /// Load configuration from `path`. Fields missing from the file keep
    /// their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))?;
        fs::write(&path, content)?;
        info!("Saved config to {}", path.as_ref().display());
        Ok(())
    }

    pub fn save_interval(&self) -> Duration {
        Duration::from_secs(self.save_interval_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
