//! Memory layout of the game executable.
//!
//! All addresses are absolute in the 32-bit image; offsets are relative to
//! the object the base pointer refers to.

/// Location of the pointer to the main application object
pub const BASE: u32 = 0x006A_9EC0;

/// Application object fields
pub mod app {
    /// Current UI screen id (4 bytes)
    pub const GAME_UI: u32 = 0x7FC;
    /// Pointer to the music controller
    pub const MUSIC: u32 = 0x83C;
    /// Pointer passed to the save routine
    pub const SAVE_CONTEXT: u32 = 0x768;
}

/// Music controller fields
pub mod music {
    /// Currently playing track id (4 bytes)
    pub const ID: u32 = 0x8;
}

/// In-process routines invoked through injected code
pub mod routine {
    /// Writes the current level state to the user data directory
    pub const SAVE: u32 = 0x0040_8C30;
    /// Switches music to the track id held in `edi`
    pub const PLAY_MUSIC: u32 = 0x0045_B750;
}

/// Music-timing field inside the save routine.
///
/// The save routine pauses the music unless this is patched around the call.
pub mod music_patch {
    pub const ADDRESS: u32 = 0x0040_8D4B;
    /// Width of the patched field
    pub const SIZE: usize = 2;
    /// Written before the save
    pub const DURING_SAVE: u32 = 106;
    /// Written after the save
    pub const RESTORED: u32 = 362;
}
