//! Long-running watcher.
//!
//! Two loops share one target: the refresh loop re-validates the process
//! handle and rebinds when the game restarts, and the save loop
//! periodically saves and backs up while a level is being played.

use std::sync::Arc;
use std::thread;

use anyhow::Result;
use pvzhe_core::{BackupManager, Config, GameUi, Target};
use tracing::{debug, error, info, warn};

use super::save::save_and_backup;
use crate::input;
use crate::platform::{self, Process};
use crate::shutdown::ShutdownSignal;

pub fn run(config: Config, auto_save: bool) -> Result<()> {
    let shutdown = Arc::new(ShutdownSignal::new());
    let shutdown_ctrlc = Arc::clone(&shutdown);
    ctrlc::set_handler(move || {
        info!("Received shutdown signal, stopping...");
        shutdown_ctrlc.trigger();
    })?;
    let _keyboard = input::spawn_keyboard_monitor(Arc::clone(&shutdown));

    let config = Arc::new(config);
    let target: Arc<Target<Process>> = Arc::new(Target::new());

    info!(
        "Watching for {:?} (auto-save {}). Press Esc or q to quit.",
        config.window_title,
        if auto_save { "on" } else { "off" }
    );

    let refresh = {
        let (target, config, shutdown) = (
            Arc::clone(&target),
            Arc::clone(&config),
            Arc::clone(&shutdown),
        );
        thread::spawn(move || refresh_loop(&target, &config, &shutdown))
    };
    let save = {
        let (target, config, shutdown) = (
            Arc::clone(&target),
            Arc::clone(&config),
            Arc::clone(&shutdown),
        );
        thread::spawn(move || save_loop(&target, &config, &shutdown, auto_save))
    };

    for handle in [refresh, save] {
        if handle.join().is_err() {
            error!("Watcher thread panicked");
            shutdown.trigger();
        }
    }

    info!("Stopped");
    Ok(())
}

fn refresh_loop(target: &Target<Process>, config: &Config, shutdown: &ShutdownSignal) {
    let mut was_live = false;
    let mut last_ui = GameUi::Unavailable;

    loop {
        match target.refresh(|| platform::locate(&config.window_title)) {
            Ok(live) => {
                if live != was_live {
                    match target.pid() {
                        Some(pid) if live => info!("Game running (pid {})", pid),
                        _ => info!("Game not running"),
                    }
                    was_live = live;
                }
            }
            Err(e) => warn!("Failed to locate game: {}", e),
        }

        match target.game_ui() {
            Ok(ui) if ui != last_ui => {
                debug!("Screen: {} -> {}", last_ui, ui);
                last_ui = ui;
            }
            Ok(_) => {}
            Err(e) => debug!("Failed to read screen: {}", e),
        }

        if shutdown.wait(config.poll_interval()) {
            break;
        }
    }
}

fn save_loop(target: &Target<Process>, config: &Config, shutdown: &ShutdownSignal, auto_save: bool) {
    let backups = BackupManager::new(&config.backup_dir, config.keep_backups);

    loop {
        if auto_save && target.is_live() {
            match save_and_backup(target, &backups, &config.save_dir, false) {
                Ok(Some(path)) => info!("Auto-saved to {}", path.display()),
                Ok(None) => debug!("Not in a level, skipping auto-save"),
                Err(e) if is_transient(&e) => {
                    warn!("Auto-save skipped, game may be loading: {:#}", e)
                }
                Err(e) => error!("Auto-save failed: {:#}", e),
            }
        }

        match backups.prune() {
            Ok(removed) if !removed.is_empty() => {
                info!("Removed {} old backup(s)", removed.len())
            }
            Ok(_) => {}
            Err(e) => warn!("Failed to prune backups: {}", e),
        }

        if shutdown.wait(config.save_interval()) {
            break;
        }
    }
}

/// A short read or write usually means the game is between screens
fn is_transient(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<pvzhe_core::Error>())
        .any(pvzhe_core::Error::is_short_transfer)
}
