//! Run an assembled routine inside the target process.

use tracing::{debug, warn};

use crate::asm::CodeBuffer;
use crate::error::{Error, Result};
use crate::process::RemoteProcess;
use crate::target::Target;

/// Allocate, relocate, copy and execute `code` in `process`, then release
/// the allocation.
///
/// Blocks until the remote thread exits. The wait has no timeout, so a
/// routine that never returns blocks the caller forever.
pub fn inject<P: RemoteProcess + ?Sized>(process: &P, mut code: CodeBuffer) -> Result<()> {
    let len = code.len();
    let base = process.allocate_executable(len)?;
    debug!(
        "Allocated {} bytes at {:#x} ({} call sites)",
        len,
        base,
        code.relocations().len()
    );

    let result = run_at(process, &mut code, base);
    process.free(base);
    debug!("Released {:#x}", base);
    result
}

fn run_at<P: RemoteProcess + ?Sized>(process: &P, code: &mut CodeBuffer, base: u64) -> Result<()> {
    code.relocate(base)?;

    let len = code.len();
    let transferred = process.write(base, code.as_bytes());
    if transferred != len {
        warn!(
            "Code copy to {:#x} wrote {} of {} bytes",
            base, transferred, len
        );
        return Err(Error::ShortWrite {
            address: base,
            requested: len,
            transferred,
        });
    }

    let thread = process.create_thread(base)?;
    debug!("Remote thread {:#x} started at {:#x}", thread.raw(), base);
    process.wait_thread(thread);
    process.close_thread(thread);
    Ok(())
}

impl<P: RemoteProcess> Target<P> {
    /// Inject `code` into the bound process.
    ///
    /// Does not take the memory lock, so pointer-chase reads keep running
    /// while the routine executes.
    pub fn inject(&self, code: CodeBuffer) -> Result<()> {
        self.with_process(|process| inject(process, code))
    }
}
