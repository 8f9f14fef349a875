//! Cross-process primitives.
//!
//! [`RemoteProcess`] is the seam between the injection/memory logic and the
//! operating system. `WinProcess` implements it over the Win32 process and
//! memory API; tests use a scripted mock.

mod elevation;
mod window;
#[cfg(target_os = "windows")]
mod win32;

#[cfg(test)]
pub mod mock;

pub use elevation::is_elevated;
pub use window::{WindowMatch, contains_ignore_case, find_window};
#[cfg(target_os = "windows")]
pub use win32::{WinProcess, locate_target};

use crate::error::Result;

/// `GetExitCodeProcess` value for a process that has not exited
pub const STILL_ACTIVE: u32 = 259;

/// Opaque handle to a thread created in the target process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteThread(u64);

impl RemoteThread {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Top-level window handle, stored as its raw value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowHandle(pub u64);

impl WindowHandle {
    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

/// Process control primitives against one target process.
///
/// Transfers report how many bytes actually moved, which is 0 or a partial
/// count when the API call fails. Deciding whether a short transfer is fatal
/// is left to the caller.
pub trait RemoteProcess: Send + Sync {
    /// Read `buf.len()` bytes at `address`
    fn read(&self, address: u64, buf: &mut [u8]) -> usize;

    /// Write all of `data` at `address`
    fn write(&self, address: u64, data: &[u8]) -> usize;

    /// Commit `size` bytes of read/write/execute memory
    fn allocate_executable(&self, size: usize) -> Result<u64>;

    /// Release a region returned by [`RemoteProcess::allocate_executable`]
    fn free(&self, address: u64);

    /// Start a thread at `entry` with no argument, running immediately
    fn create_thread(&self, entry: u64) -> Result<RemoteThread>;

    /// Block until the thread exits. There is no timeout.
    fn wait_thread(&self, thread: RemoteThread);

    fn close_thread(&self, thread: RemoteThread);

    /// Exit code of the process, or `None` if it could not be queried
    fn exit_code(&self) -> Option<u32>;
}

/// A located target: its window, the owning process id, and an open process.
#[derive(Debug)]
pub struct Binding<P> {
    pub window: WindowHandle,
    pub pid: u32,
    pub process: P,
}

impl<P: RemoteProcess> Binding<P> {
    pub fn new(window: WindowHandle, pid: u32, process: P) -> Self {
        Self {
            window,
            pid,
            process,
        }
    }

    /// The process is considered running only while its exit code is still
    /// [`STILL_ACTIVE`]
    pub fn is_running(&self) -> bool {
        !self.window.is_null() && self.process.exit_code() == Some(STILL_ACTIVE)
    }
}
