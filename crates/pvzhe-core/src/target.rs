//! Target process handle management.
//!
//! A [`Target`] owns the binding to the game process (window, pid, open
//! process) and the lock that serializes pointer-chase transfers against it.
//! It is shared by reference between the polling loops and ad hoc callers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::process::{Binding, RemoteProcess, WindowHandle};

/// Lifecycle of a target binding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetState {
    /// No window has been found yet
    Unbound,
    /// Bound and the process is still running
    Bound,
    /// Bound, but the process has exited. The stale handle is kept until a
    /// new window is found.
    Invalid,
}

pub struct Target<P> {
    binding: RwLock<Option<Binding<P>>>,
    memory_lock: Mutex<()>,
    live: AtomicBool,
}

impl<P: RemoteProcess> Target<P> {
    pub fn new() -> Self {
        Self {
            binding: RwLock::new(None),
            memory_lock: Mutex::new(()),
            live: AtomicBool::new(false),
        }
    }

    /// Create a target that is already bound
    pub fn bound(binding: Binding<P>) -> Self {
        let target = Self::new();
        target.bind(binding);
        target
    }

    /// Replace the current binding, dropping (and closing) the old one
    pub fn bind(&self, binding: Binding<P>) {
        info!("Bound to pid {} (window {:#x})", binding.pid, binding.window.0);
        let running = binding.is_running();
        *self.write_binding() = Some(binding);
        self.live.store(running, Ordering::Release);
    }

    /// Probe the process exit code. This is the authoritative liveness check.
    pub fn is_valid(&self) -> bool {
        self.read_binding()
            .as_ref()
            .is_some_and(|binding| binding.is_running())
    }

    /// Liveness as of the last [`Target::refresh`] or [`Target::bind`].
    ///
    /// Lock-free and possibly stale; operations still check validity
    /// themselves and fail if the process is gone.
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    pub fn state(&self) -> TargetState {
        match self.read_binding().as_ref() {
            None => TargetState::Unbound,
            Some(binding) if binding.is_running() => TargetState::Bound,
            Some(_) => TargetState::Invalid,
        }
    }

    /// Re-validate the binding, and if it is not valid ask `locate` for a
    /// fresh one.
    ///
    /// `locate` is only called while the target is unbound or invalid. It
    /// returns `Ok(None)` when no matching window exists. Returns the
    /// resulting liveness.
    pub fn refresh<F>(&self, locate: F) -> Result<bool>
    where
        F: FnOnce() -> Result<Option<Binding<P>>>,
    {
        if self.is_valid() {
            self.live.store(true, Ordering::Release);
            return Ok(true);
        }

        if self.live.swap(false, Ordering::AcqRel) {
            info!("Target process is no longer running");
        }

        match locate()? {
            Some(binding) => {
                self.bind(binding);
                Ok(self.is_live())
            }
            None => {
                debug!("No target window found");
                Ok(false)
            }
        }
    }

    pub fn pid(&self) -> Option<u32> {
        self.read_binding().as_ref().map(|binding| binding.pid)
    }

    pub fn window(&self) -> Option<WindowHandle> {
        self.read_binding().as_ref().map(|binding| binding.window)
    }

    /// Run `f` against the process if it is currently running
    pub(crate) fn with_process<R>(&self, f: impl FnOnce(&P) -> Result<R>) -> Result<R> {
        let guard = self.read_binding();
        match guard.as_ref() {
            Some(binding) if binding.is_running() => f(&binding.process),
            _ => Err(Error::InvalidTarget),
        }
    }

    /// Take the exclusivity token for a pointer-chase transfer
    pub(crate) fn lock_memory(&self) -> MutexGuard<'_, ()> {
        // The guarded value is (), so a poisoned lock is still usable
        self.memory_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn read_binding(&self) -> RwLockReadGuard<'_, Option<Binding<P>>> {
        self.binding
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_binding(&self) -> RwLockWriteGuard<'_, Option<Binding<P>>> {
        self.binding
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<P: RemoteProcess> Default for Target<P> {
    fn default() -> Self {
        Self::new()
    }
}
