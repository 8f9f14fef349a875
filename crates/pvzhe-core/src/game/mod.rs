//! Game-specific operations built on the memory and injection primitives.

pub mod layout;
mod ui;

pub use ui::GameUi;

use tracing::{debug, info, warn};

use crate::asm::{CodeBuffer, Register};
use crate::error::{Error, Result};
use crate::memory::AddressPath;
use crate::process::RemoteProcess;
use crate::target::Target;

/// Code that calls the in-process save routine.
///
/// ```text
/// mov ecx, [BASE]
/// mov ecx, [ecx + SAVE_CONTEXT]
/// push ecx
/// call SAVE
/// ret
/// ```
pub fn save_routine() -> Result<CodeBuffer> {
    let mut code = CodeBuffer::new();
    code.mov_from_abs(Register::Ecx, layout::BASE)?;
    code.mov_from_disp(Register::Ecx, Register::Ecx, layout::app::SAVE_CONTEXT)?;
    code.push_reg(Register::Ecx)?;
    code.call(layout::routine::SAVE)?;
    code.ret()?;
    Ok(code)
}

/// Code that switches the music to track `id`
pub fn play_music_routine(id: i32) -> Result<CodeBuffer> {
    let mut code = CodeBuffer::new();
    code.mov_imm(Register::Edi, id)?;
    code.mov_from_abs(Register::Eax, layout::BASE)?;
    code.mov_from_disp(Register::Eax, Register::Eax, layout::app::MUSIC)?;
    code.call(layout::routine::PLAY_MUSIC)?;
    code.ret()?;
    Ok(code)
}

fn path(offsets: &[u32]) -> Result<AddressPath> {
    let offsets: Vec<i32> = offsets.iter().map(|&o| o as i32).collect();
    AddressPath::new(&offsets)
}

impl<P: RemoteProcess> Target<P> {
    /// Current screen, or [`GameUi::Unavailable`] if the game is not running
    pub fn game_ui(&self) -> Result<GameUi> {
        match self.read::<i32>(&path(&[layout::BASE, layout::app::GAME_UI])?) {
            Ok(raw) => Ok(GameUi::from_raw(raw)),
            Err(Error::InvalidTarget) => Ok(GameUi::Unavailable),
            Err(e) => Err(e),
        }
    }

    /// Id of the music track currently playing
    pub fn music_id(&self) -> Result<i32> {
        self.read::<i32>(&path(&[
            layout::BASE,
            layout::app::MUSIC,
            layout::music::ID,
        ])?)
    }

    pub fn play_music(&self, id: i32) -> Result<()> {
        debug!("Playing music {}", id);
        self.inject(play_music_routine(id)?)
    }

    /// Make the game write its save data to disk.
    ///
    /// The music-timing field is patched for the duration of the call and
    /// restored afterwards, even when the call fails.
    pub fn save_game(&self) -> Result<()> {
        let patch = path(&[layout::music_patch::ADDRESS])?;
        let code = save_routine()?;

        self.write_music_patch(layout::music_patch::DURING_SAVE, &patch)?;
        let saved = self.inject(code);
        let restored = self.write_music_patch(layout::music_patch::RESTORED, &patch);

        if let Err(e) = &restored {
            warn!("Failed to restore music timing: {}", e);
        }
        saved?;
        restored?;
        info!("Game saved");
        Ok(())
    }

    /// Whether restoring a backup is safe now.
    ///
    /// Refused while a level is in progress; allowed when the game is closed.
    pub fn recovery_allowed(&self) -> Result<bool> {
        Ok(!self.game_ui()?.is_in_level())
    }

    /// Whether a save should run now: only while a level is being played,
    /// unless `force` is set.
    pub fn save_allowed(&self, force: bool) -> Result<bool> {
        Ok(force || self.game_ui()?.is_playing())
    }

    fn write_music_patch(&self, value: u32, patch: &AddressPath) -> Result<()> {
        self.write_bytes(&value.to_le_bytes(), layout::music_patch::SIZE, patch)
    }
}
