use anyhow::Result;
use pvzhe_core::Config;

use super::connect;

pub fn run(config: &Config, id: Option<i32>) -> Result<()> {
    let target = connect(config)?;
    match id {
        Some(id) => {
            target.play_music(id)?;
            println!("Playing music {}", id);
        }
        None => println!("{}", target.music_id()?),
    }
    Ok(())
}
