//! Process elevation check.
//!
//! Writing under `HKEY_CLASSES_ROOT` needs an elevated (administrator) token.

/// Check whether the current process runs with an elevated token.
#[cfg(target_os = "windows")]
pub fn is_process_elevated() -> bool {
    use std::ffi::c_void;
    use windows::Win32::Foundation::{CloseHandle, HANDLE};
    use windows::Win32::Security::{
        GetTokenInformation, TokenElevation, TOKEN_ELEVATION, TOKEN_QUERY,
    };
    use windows::Win32::System::Threading::{GetCurrentProcess, OpenProcessToken};

    unsafe {
        let mut token = HANDLE::default();
        if OpenProcessToken(GetCurrentProcess(), TOKEN_QUERY, &mut token).is_err() {
            log::warn!("Failed to open the process token, assuming not elevated");
            return false;
        }

        let mut elevation = TOKEN_ELEVATION::default();
        let mut returned = 0u32;
        let queried = GetTokenInformation(
            token,
            TokenElevation,
            Some(&mut elevation as *mut TOKEN_ELEVATION as *mut c_void),
            std::mem::size_of::<TOKEN_ELEVATION>() as u32,
            &mut returned,
        );
        let _ = CloseHandle(token);

        queried.is_ok() && elevation.TokenIsElevated != 0
    }
}

/// Elevation only exists on Windows; nothing else can write the registry.
#[cfg(not(target_os = "windows"))]
pub fn is_process_elevated() -> bool {
    false
}
