use anyhow::{Result, bail};
use pvzhe_core::{BackupManager, Config};
use tracing::warn;

use super::locate;

pub fn run(config: &Config, name: &str) -> Result<()> {
    let target = locate(config)?;
    if !target.recovery_allowed()? {
        bail!(
            "Cannot recover while a level is open (screen: {}); return to the menu or close the game first",
            target.game_ui()?
        );
    }
    if target.is_live() {
        warn!("Game is running; it may overwrite the restored data when it next saves");
    }

    let backups = BackupManager::new(&config.backup_dir, config.keep_backups);
    backups.restore(name, &config.save_dir)?;
    println!("Restored {} to {}", name, config.save_dir.display());
    Ok(())
}
