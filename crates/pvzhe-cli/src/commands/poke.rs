use anyhow::Result;
use pvzhe_core::{AddressPath, Config};
use tracing::info;

use super::connect;
use super::hex_utils::{format_bytes, value_bytes};

pub fn run(config: &Config, path: &AddressPath, value: u64, size: usize) -> Result<()> {
    let bytes = value_bytes(value, size)?;
    let target = connect(config)?;
    target.write_bytes(&bytes, size, path)?;
    info!("Wrote {} to {}", format_bytes(&bytes), path);
    println!("{} <- 0x{:X}", path, value);
    Ok(())
}
