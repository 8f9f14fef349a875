//! The process backend for the current OS.

#[cfg(target_os = "windows")]
pub use pvzhe_core::{WinProcess as Process, locate_target as locate};

#[cfg(not(target_os = "windows"))]
pub use unsupported::{Process, locate};

#[cfg(not(target_os = "windows"))]
mod unsupported {
    use pvzhe_core::{Binding, Error, RemoteProcess, RemoteThread, Result};

    /// No process can be opened on this OS, so no value of this type exists
    pub enum Process {}

    impl RemoteProcess for Process {
        fn read(&self, _address: u64, _buf: &mut [u8]) -> usize {
            match *self {}
        }

        fn write(&self, _address: u64, _data: &[u8]) -> usize {
            match *self {}
        }

        fn allocate_executable(&self, _size: usize) -> Result<u64> {
            match *self {}
        }

        fn free(&self, _address: u64) {
            match *self {}
        }

        fn create_thread(&self, _entry: u64) -> Result<RemoteThread> {
            match *self {}
        }

        fn wait_thread(&self, _thread: RemoteThread) {
            match *self {}
        }

        fn close_thread(&self, _thread: RemoteThread) {
            match *self {}
        }

        fn exit_code(&self) -> Option<u32> {
            match *self {}
        }
    }

    pub fn locate(_title: &str) -> Result<Option<Binding<Process>>> {
        Err(Error::Unsupported("Process access"))
    }
}
