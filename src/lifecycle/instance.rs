//! Single-instance guard
//!
//! Two remappers on the same keyboard would fight over every Caps Lock
//! press, so only one may run per session. Ownership is a named mutex held
//! for the lifetime of the process.

/// Errors that can occur while claiming the instance
#[derive(Debug, thiserror::Error)]
pub enum InstanceError {
    #[error("Another instance of Switchy is already running!")]
    AlreadyRunning,

    #[error("failed to create instance mutex: {0}")]
    Mutex(String),
}

#[cfg(target_os = "windows")]
pub use self::named_mutex::InstanceGuard;

#[cfg(target_os = "windows")]
mod named_mutex {
    use tracing::debug;
    use windows::core::w;
    use windows::Win32::Foundation::{CloseHandle, GetLastError, ERROR_ALREADY_EXISTS, HANDLE};
    use windows::Win32::System::Threading::CreateMutexW;

    use super::InstanceError;

    /// Holds the instance mutex; released on drop
    #[derive(Debug)]
    pub struct InstanceGuard {
        handle: HANDLE,
    }

    impl InstanceGuard {
        pub fn acquire() -> Result<Self, InstanceError> {
            // SAFETY: the name is a static wide string
            let handle = unsafe { CreateMutexW(None, false, w!("Switchy")) }
                .map_err(|e| InstanceError::Mutex(e.to_string()))?;

            // SAFETY: read immediately after the call that set it
            if unsafe { GetLastError() } == ERROR_ALREADY_EXISTS {
                // SAFETY: handle was just returned by CreateMutexW
                let _ = unsafe { CloseHandle(handle) };
                return Err(InstanceError::AlreadyRunning);
            }

            debug!("instance mutex acquired");
            Ok(Self { handle })
        }
    }

    impl Drop for InstanceGuard {
        fn drop(&mut self) {
            // SAFETY: we own the handle and close it exactly once
            let _ = unsafe { CloseHandle(self.handle) };
        }
    }
}
