//! Small Windows queries used at startup
//!
//! Other targets get inert fallbacks so the rest of the crate builds and
//! tests everywhere.

#[cfg(target_os = "windows")]
mod imp {
    use windows::core::{s, w, HSTRING};
    use windows::Win32::System::LibraryLoader::{GetModuleHandleW, GetProcAddress};
    use windows::Win32::System::SystemInformation::OSVERSIONINFOW;
    use windows::Win32::UI::Input::KeyboardAndMouse::{GetKeyState, VK_CAPITAL};
    use windows::Win32::UI::WindowsAndMessaging::{MessageBoxW, MB_ICONERROR, MB_OK};

    type RtlGetVersion = unsafe extern "system" fn(*mut OSVERSIONINFOW) -> i32;

    /// Major OS version from `RtlGetVersion`, which unlike `GetVersionEx`
    /// is not subject to compatibility shims
    pub fn os_major_version() -> Option<u32> {
        // SAFETY: ntdll is mapped into every process
        let module = unsafe { GetModuleHandleW(w!("ntdll.dll")) }.ok()?;
        // SAFETY: the name is a valid NUL-terminated string
        let proc = unsafe { GetProcAddress(module, s!("RtlGetVersion")) }?;
        // SAFETY: RtlGetVersion has exactly this signature
        let rtl_get_version: RtlGetVersion = unsafe { std::mem::transmute(proc) };

        let mut info = OSVERSIONINFOW {
            dwOSVersionInfoSize: std::mem::size_of::<OSVERSIONINFOW>() as u32,
            ..Default::default()
        };
        // SAFETY: info is a properly sized, writable OSVERSIONINFOW
        let status = unsafe { rtl_get_version(&mut info) };
        (status == 0).then_some(info.dwMajorVersion)
    }

    pub fn caps_lock_on() -> bool {
        // SAFETY: no preconditions
        let state = unsafe { GetKeyState(VK_CAPITAL.0 as i32) };
        state & 0x0001 != 0
    }

    /// Blocking error dialog
    pub fn show_error(message: &str) {
        // SAFETY: both strings outlive the call
        unsafe {
            let _ = MessageBoxW(None, &HSTRING::from(message), w!("Error"), MB_OK | MB_ICONERROR);
        }
    }
}

#[cfg(not(target_os = "windows"))]
mod imp {
    pub fn os_major_version() -> Option<u32> {
        None
    }

    pub fn caps_lock_on() -> bool {
        false
    }

    /// No dialog outside Windows; callers log the error themselves
    pub fn show_error(_message: &str) {}
}

pub use imp::{caps_lock_on, os_major_version, show_error};
