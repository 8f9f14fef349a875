//! # pvzhe-core
//!
//! Core library for the Plants vs. Zombies Hybrid Edition save guard.
//!
//! This crate provides:
//! - A minimal x86 encoder with call-site relocation (`asm`)
//! - Remote code injection into the game process
//! - Pointer-chase memory reads and writes serialized per target
//! - Target process binding and liveness tracking
//! - Game operations (save, music, UI state) at fixed offsets
//! - Timestamped save-directory backups with retention
//!
//! The Win32 process backend is only built on Windows. Everything else runs
//! against the [`RemoteProcess`] trait.

pub mod asm;
pub mod backup;
pub mod config;
pub mod error;
pub mod game;
pub mod inject;
pub mod memory;
pub mod process;
pub mod target;

pub use asm::{CodeBuffer, Register};
pub use backup::BackupManager;
pub use config::Config;
pub use error::{Error, Result};
pub use game::GameUi;
pub use inject::inject;
pub use memory::AddressPath;
pub use process::{Binding, RemoteProcess, RemoteThread, WindowHandle, is_elevated};
#[cfg(target_os = "windows")]
pub use process::{WinProcess, locate_target};
pub use target::{Target, TargetState};
