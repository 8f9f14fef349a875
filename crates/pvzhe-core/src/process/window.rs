//! Target window discovery by title.

#[cfg(not(target_os = "windows"))]
use crate::error::Error;
use crate::error::Result;

use super::WindowHandle;

/// Maximum number of UTF-16 units read from a window title
pub const MAX_TITLE_LENGTH: usize = 255;

/// A top-level window whose title matched the search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowMatch {
    pub handle: WindowHandle,
    pub title: String,
}

/// Case-insensitive substring test
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(target_os = "windows")]
struct Search<'a> {
    needle: &'a str,
    found: Option<WindowMatch>,
}

/// Find the first top-level window whose title contains `needle`,
/// ignoring case. Windows with empty titles are skipped.
#[cfg(target_os = "windows")]
pub fn find_window(needle: &str) -> Result<Option<WindowMatch>> {
    use windows::Win32::Foundation::LPARAM;
    use windows::Win32::UI::WindowsAndMessaging::EnumWindows;

    let mut search = Search {
        needle,
        found: None,
    };

    // SAFETY: the callback only dereferences LPARAM as the `Search` that
    // outlives this call. EnumWindows reports an error when the callback stops
    // the enumeration early, so the result is ignored.
    unsafe {
        let _ = EnumWindows(
            Some(enum_callback),
            LPARAM(&mut search as *mut Search as isize),
        );
    }

    Ok(search.found)
}

#[cfg(target_os = "windows")]
unsafe extern "system" fn enum_callback(
    hwnd: windows::Win32::Foundation::HWND,
    lparam: windows::Win32::Foundation::LPARAM,
) -> windows::Win32::Foundation::BOOL {
    use windows::Win32::Foundation::BOOL;
    use windows::Win32::UI::WindowsAndMessaging::GetWindowTextW;

    let search = unsafe { &mut *(lparam.0 as *mut Search) };

    let mut buf = [0u16; MAX_TITLE_LENGTH];
    let len = unsafe { GetWindowTextW(hwnd, &mut buf) };
    if len <= 0 {
        return BOOL(1);
    }

    let title = String::from_utf16_lossy(&buf[..len as usize]);
    if contains_ignore_case(&title, search.needle) {
        search.found = Some(WindowMatch {
            handle: WindowHandle(hwnd.0 as usize as u64),
            title,
        });
        return BOOL(0); // Stop enumeration
    }
    BOOL(1)
}

#[cfg(not(target_os = "windows"))]
pub fn find_window(_needle: &str) -> Result<Option<WindowMatch>> {
    Err(Error::Unsupported("Window enumeration"))
}
