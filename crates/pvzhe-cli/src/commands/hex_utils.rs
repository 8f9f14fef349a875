//! Hex value parsing and formatting for the raw memory commands.

use anyhow::{Result, bail};

/// Parse a hex value, with or without the 0x prefix
pub fn parse_hex_value(s: &str) -> Result<u64> {
    let digits = s.trim_start_matches("0x").trim_start_matches("0X");
    u64::from_str_radix(digits, 16).map_err(|e| anyhow::anyhow!("Invalid hex value {:?}: {}", s, e))
}

/// Transfer width accepted by `peek` and `poke`
pub fn parse_size(s: &str) -> std::result::Result<usize, String> {
    match s.parse::<usize>() {
        Ok(size @ (1 | 2 | 4 | 8)) => Ok(size),
        _ => Err(format!("size must be 1, 2, 4 or 8, got {}", s)),
    }
}

/// Little-endian bytes of `value`, truncated to `size`.
///
/// Fails if `value` does not fit.
pub fn value_bytes(value: u64, size: usize) -> Result<Vec<u8>> {
    if size < 8 && value >> (size * 8) != 0 {
        bail!("Value 0x{:X} does not fit in {} bytes", value, size);
    }
    Ok(value.to_le_bytes()[..size].to_vec())
}

/// Unsigned little-endian value of up to 8 bytes
pub fn bytes_value(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .rev()
        .fold(0u64, |acc, &b| (acc << 8) | u64::from(b))
}

/// `AA BB CC` style dump
pub fn format_bytes(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
