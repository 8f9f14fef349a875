use anyhow::Result;
use pvzhe_core::{Config, TargetState};

use super::locate;

pub fn run(config: &Config) -> Result<()> {
    let target = locate(config)?;

    println!("Window:  {:?}", config.window_title);
    match target.state() {
        TargetState::Unbound => {
            println!("State:   not running");
            return Ok(());
        }
        TargetState::Invalid => println!("State:   exited"),
        TargetState::Bound => println!("State:   running"),
    }
    if let Some(pid) = target.pid() {
        println!("PID:     {}", pid);
    }

    let ui = target.game_ui()?;
    println!("Screen:  {} ({})", ui, ui.raw());
    if target.is_valid() {
        println!("Music:   {}", target.music_id()?);
    }
    Ok(())
}
