use anyhow::Result;
use pvzhe_core::{BackupManager, Config};

pub fn run(config: &Config) -> Result<()> {
    let backups = BackupManager::new(&config.backup_dir, config.keep_backups);
    let names = backups.list()?;

    if names.is_empty() {
        println!("No backups in {}", backups.root().display());
        return Ok(());
    }

    println!("{} backup(s) in {}:", names.len(), backups.root().display());
    for name in names {
        println!("  {}", name);
    }
    Ok(())
}
