use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use pvzhe_core::{BackupManager, Config, RemoteProcess, Target};
use tracing::info;

use super::connect;

pub fn run(config: &Config, force: bool) -> Result<()> {
    let target = connect(config)?;
    let backups = BackupManager::new(&config.backup_dir, config.keep_backups);

    match save_and_backup(&target, &backups, &config.save_dir, force)? {
        Some(path) => println!("Saved and backed up to {}", path.display()),
        None => bail!(
            "Not in a level (screen: {}); use --force to save anyway",
            target.game_ui()?
        ),
    }

    backups.prune()?;
    Ok(())
}

/// Save the game and copy its save directory into a new backup.
///
/// Does nothing and returns `None` unless a level is being played or
/// `force` is set.
pub fn save_and_backup<P: RemoteProcess>(
    target: &Target<P>,
    backups: &BackupManager,
    save_dir: &Path,
    force: bool,
) -> Result<Option<PathBuf>> {
    if !target.save_allowed(force)? {
        return Ok(None);
    }

    target.save_game().context("Save failed")?;
    let path = backups
        .create_from(save_dir)
        .with_context(|| format!("Failed to back up {}", save_dir.display()))?;
    info!("Backup {}", path.display());
    Ok(Some(path))
}
