use anyhow::Result;
use pvzhe_core::{AddressPath, Config};

use super::connect;
use super::hex_utils::{bytes_value, format_bytes};

pub fn run(config: &Config, path: &AddressPath, size: usize) -> Result<()> {
    let target = connect(config)?;
    let bytes = target.read_bytes(size, path)?;
    let value = bytes_value(&bytes);
    println!("{} = {}  (0x{:X}, {})", path, format_bytes(&bytes), value, value);
    Ok(())
}
