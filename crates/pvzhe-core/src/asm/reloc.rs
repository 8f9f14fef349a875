//! Call-site relocation.

use tracing::trace;

use super::encoder::CodeBuffer;
use crate::error::{Error, Result};

/// Size of a near-call displacement operand
const DISP_SIZE: usize = 4;

/// Displacement for a near call whose operand sits at `site` in code loaded at `base`.
///
/// The CPU adds the displacement to the address of the next instruction,
/// which is the byte right after the 4-byte operand. Arithmetic wraps like
/// the 32-bit address space it models.
pub fn call_displacement(target: u32, base: u32, site: usize) -> i32 {
    let next_insn = base.wrapping_add(site as u32).wrapping_add(DISP_SIZE as u32);
    target.wrapping_sub(next_insn) as i32
}

impl CodeBuffer {
    /// Rewrite every recorded call operand from an absolute target into a
    /// displacement valid when the buffer is loaded at `base`.
    ///
    /// Sites are visited once each, in the order they were emitted. Calling
    /// this twice would treat displacements as absolute targets, so the
    /// injector consumes the buffer after relocating it.
    pub fn relocate(&mut self, base: u64) -> Result<()> {
        let base = u32::try_from(base).map_err(|_| Error::AddressOutOfRange(base))?;
        let sites = self.relocations().to_vec();
        let code = self.bytes_mut();

        for site in sites {
            let operand = code
                .get_mut(site..site + DISP_SIZE)
                .ok_or(Error::InvalidRelocation { offset: site })?;
            let target = i32::from_le_bytes([operand[0], operand[1], operand[2], operand[3]]);
            let disp = call_displacement(target as u32, base, site);
            trace!("relocate call at +{}: {:#010x} -> rel {:#x}", site, target, disp);
            operand.copy_from_slice(&disp.to_le_bytes());
        }

        Ok(())
    }
}
