//! CLI command implementations.

pub mod backups;
pub mod hex_utils;
pub mod music;
pub mod peek;
pub mod poke;
pub mod recover;
pub mod save;
pub mod status;
pub mod watch;

use anyhow::{Context, Result, bail};
use pvzhe_core::{Config, Target};

use crate::platform::{self, Process};

/// Bind a target to the configured game window, if one exists
pub fn locate(config: &Config) -> Result<Target<Process>> {
    let target = Target::new();
    target
        .refresh(|| platform::locate(&config.window_title))
        .with_context(|| format!("Failed to open game window {:?}", config.window_title))?;
    Ok(target)
}

/// Like [`locate`], but the game must be running
pub fn connect(config: &Config) -> Result<Target<Process>> {
    let target = locate(config)?;
    if !target.is_live() {
        bail!("Game window {:?} not found", config.window_title);
    }
    Ok(target)
}
