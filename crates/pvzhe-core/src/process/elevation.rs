//! Administrator check.

use crate::error::Result;

/// Whether the current process runs with an elevated token.
///
/// Opening the game with full access rights usually requires it.
#[cfg(target_os = "windows")]
pub fn is_elevated() -> Result<bool> {
    use windows::Win32::Foundation::{CloseHandle, HANDLE};
    use windows::Win32::Security::{
        GetTokenInformation, TOKEN_ELEVATION, TOKEN_QUERY, TokenElevation,
    };
    use windows::Win32::System::Threading::{GetCurrentProcess, OpenProcessToken};

    use crate::error::Error;

    let mut token = HANDLE::default();
    // SAFETY: the pseudo handle from GetCurrentProcess needs no cleanup.
    unsafe { OpenProcessToken(GetCurrentProcess(), TOKEN_QUERY, &mut token) }
        .map_err(|e| Error::ProcessOpenFailed(format!("OpenProcessToken: {e}")))?;

    let mut elevation = TOKEN_ELEVATION::default();
    let mut returned = 0u32;
    // SAFETY: the buffer is a TOKEN_ELEVATION of the size passed in.
    let result = unsafe {
        GetTokenInformation(
            token,
            TokenElevation,
            Some(&mut elevation as *mut TOKEN_ELEVATION as *mut _),
            std::mem::size_of::<TOKEN_ELEVATION>() as u32,
            &mut returned,
        )
    };
    // SAFETY: token was opened above.
    unsafe {
        let _ = CloseHandle(token);
    }
    result.map_err(|e| Error::ProcessOpenFailed(format!("GetTokenInformation: {e}")))?;

    Ok(elevation.TokenIsElevated != 0)
}

#[cfg(not(target_os = "windows"))]
pub fn is_elevated() -> Result<bool> {
    Err(crate::error::Error::Unsupported("Elevation check"))
}
