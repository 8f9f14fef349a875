//! Win32 implementation of [`RemoteProcess`].

use std::ffi::c_void;

use tracing::{debug, warn};
use windows::Win32::Foundation::{CloseHandle, HANDLE, HWND};
use windows::Win32::System::Diagnostics::Debug::{ReadProcessMemory, WriteProcessMemory};
use windows::Win32::System::Memory::{
    MEM_COMMIT, MEM_RELEASE, PAGE_EXECUTE_READWRITE, VirtualAllocEx, VirtualFreeEx,
};
use windows::Win32::System::Threading::{
    CreateRemoteThread, GetExitCodeProcess, INFINITE, OpenProcess, PROCESS_ALL_ACCESS,
    WaitForSingleObject,
};
use windows::Win32::UI::WindowsAndMessaging::GetWindowThreadProcessId;

use super::window::find_window;
use super::{Binding, RemoteProcess, RemoteThread};
use crate::error::{Error, Result};

/// An open handle to the target process with full access rights
#[derive(Debug)]
pub struct WinProcess {
    handle: HANDLE,
    pid: u32,
}

// SAFETY: a process handle is a kernel object reference that Win32 allows to
// be used from any thread.
unsafe impl Send for WinProcess {}
unsafe impl Sync for WinProcess {}

impl WinProcess {
    /// Open the process with `PROCESS_ALL_ACCESS`
    pub fn open(pid: u32) -> Result<Self> {
        // SAFETY: OpenProcess has no preconditions; failure is reported as Err.
        let handle = unsafe { OpenProcess(PROCESS_ALL_ACCESS, false, pid) }
            .map_err(|e| Error::ProcessOpenFailed(format!("pid {}: {}", pid, e)))?;
        debug!("Opened process {} (handle {:?})", pid, handle);
        Ok(Self { handle, pid })
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }
}

impl RemoteProcess for WinProcess {
    fn read(&self, address: u64, buf: &mut [u8]) -> usize {
        let mut transferred = 0usize;
        // SAFETY: buf is valid for buf.len() bytes of writes.
        let result = unsafe {
            ReadProcessMemory(
                self.handle,
                address as usize as *const c_void,
                buf.as_mut_ptr().cast(),
                buf.len(),
                Some(&mut transferred),
            )
        };
        if let Err(e) = result {
            debug!("ReadProcessMemory at {:#x} failed: {}", address, e);
        }
        transferred
    }

    fn write(&self, address: u64, data: &[u8]) -> usize {
        let mut transferred = 0usize;
        // SAFETY: data is valid for data.len() bytes of reads.
        let result = unsafe {
            WriteProcessMemory(
                self.handle,
                address as usize as *const c_void,
                data.as_ptr().cast(),
                data.len(),
                Some(&mut transferred),
            )
        };
        if let Err(e) = result {
            debug!("WriteProcessMemory at {:#x} failed: {}", address, e);
        }
        transferred
    }

    fn allocate_executable(&self, size: usize) -> Result<u64> {
        // SAFETY: allocation in a foreign process does not touch our memory.
        let addr = unsafe {
            VirtualAllocEx(self.handle, None, size, MEM_COMMIT, PAGE_EXECUTE_READWRITE)
        };
        if addr.is_null() {
            return Err(Error::AllocationFailed { size });
        }
        Ok(addr as usize as u64)
    }

    fn free(&self, address: u64) {
        // SAFETY: address came from allocate_executable on this handle.
        let result =
            unsafe { VirtualFreeEx(self.handle, address as usize as *mut c_void, 0, MEM_RELEASE) };
        if let Err(e) = result {
            warn!("VirtualFreeEx at {:#x} failed: {}", address, e);
        }
    }

    fn create_thread(&self, entry: u64) -> Result<RemoteThread> {
        // SAFETY: the entry point is only ever called inside the target process.
        let start: unsafe extern "system" fn(*mut c_void) -> u32 =
            unsafe { std::mem::transmute(entry as usize) };

        // SAFETY: no thread attributes, parameter or thread id out-pointer.
        let thread = unsafe { CreateRemoteThread(self.handle, None, 0, Some(start), None, 0, None) }
            .map_err(|e| Error::ThreadCreationFailed {
                entry,
                message: e.to_string(),
            })?;
        Ok(RemoteThread::from_raw(thread.0 as usize as u64))
    }

    fn wait_thread(&self, thread: RemoteThread) {
        // SAFETY: the handle was returned by CreateRemoteThread and is still open.
        unsafe {
            WaitForSingleObject(thread_handle(thread), INFINITE);
        }
    }

    fn close_thread(&self, thread: RemoteThread) {
        // SAFETY: the handle is closed exactly once by the injector.
        unsafe {
            let _ = CloseHandle(thread_handle(thread));
        }
    }

    fn exit_code(&self) -> Option<u32> {
        let mut code = 0u32;
        // SAFETY: code is a valid out-pointer.
        unsafe { GetExitCodeProcess(self.handle, &mut code) }
            .ok()
            .map(|_| code)
    }
}

impl Drop for WinProcess {
    fn drop(&mut self) {
        if !self.handle.is_invalid() {
            // SAFETY: the handle is owned by this value.
            unsafe {
                let _ = CloseHandle(self.handle);
            }
        }
    }
}

fn thread_handle(thread: RemoteThread) -> HANDLE {
    HANDLE(thread.raw() as usize as *mut c_void)
}

/// Find the target window by title and open its owning process.
///
/// Returns `Ok(None)` when no matching window exists.
pub fn locate_target(title: &str) -> Result<Option<Binding<WinProcess>>> {
    let Some(found) = find_window(title)? else {
        return Ok(None);
    };

    let hwnd = HWND(found.handle.0 as usize as *mut c_void);
    let mut pid = 0u32;
    // SAFETY: hwnd came from EnumWindows; a stale handle only yields pid 0.
    unsafe { GetWindowThreadProcessId(hwnd, Some(&mut pid)) };
    if pid == 0 {
        return Err(Error::WindowNotFound(found.title));
    }

    let process = WinProcess::open(pid)?;
    debug!("Located {:?} (pid {})", found.title, pid);
    Ok(Some(Binding::new(found.handle, pid, process)))
}
