//! Key injection
//!
//! The remapper only requests key presses; an injector performs them. The
//! Windows implementation batches every action of a verdict into one
//! `SendInput` call so the system sees them in order and uninterrupted.

use crate::remap::SynthKeyAction;

/// Errors that can occur while injecting keys
#[derive(Debug, thiserror::Error)]
pub enum InjectError {
    #[error("SendInput accepted {sent} of {expected} key events")]
    Partial { sent: u32, expected: usize },

    #[error("key injection failed: {0}")]
    Platform(String),
}

/// Injects synthesized key actions into the system input stream
pub trait KeyInjector {
    /// Inject all actions, in order
    fn inject(&self, actions: &[SynthKeyAction]) -> Result<(), InjectError>;
}

#[cfg(target_os = "windows")]
pub use self::send_input::SendInputInjector;

#[cfg(target_os = "windows")]
mod send_input {
    use smallvec::SmallVec;
    use windows::Win32::UI::Input::KeyboardAndMouse::{
        SendInput, INPUT, INPUT_0, INPUT_KEYBOARD, KEYBDINPUT, KEYBD_EVENT_FLAGS,
        KEYEVENTF_EXTENDEDKEY, KEYEVENTF_KEYUP, VIRTUAL_KEY,
    };

    use super::{InjectError, KeyInjector};
    use crate::remap::{Direction, SynthKeyAction};

    /// [`KeyInjector`] backed by `SendInput`
    #[derive(Debug, Default)]
    pub struct SendInputInjector;

    impl KeyInjector for SendInputInjector {
        fn inject(&self, actions: &[SynthKeyAction]) -> Result<(), InjectError> {
            if actions.is_empty() {
                return Ok(());
            }

            let inputs: SmallVec<[INPUT; 6]> = actions.iter().map(|a| keyboard_input(*a)).collect();

            // SAFETY: every INPUT is a fully initialised keyboard input
            let sent = unsafe { SendInput(&inputs, std::mem::size_of::<INPUT>() as i32) };

            if sent == 0 {
                return Err(InjectError::Platform(
                    std::io::Error::last_os_error().to_string(),
                ));
            }
            if sent as usize != inputs.len() {
                return Err(InjectError::Partial {
                    sent,
                    expected: inputs.len(),
                });
            }
            Ok(())
        }
    }

    fn keyboard_input(action: SynthKeyAction) -> INPUT {
        let mut flags = KEYBD_EVENT_FLAGS(0);
        if action.direction == Direction::Release {
            flags |= KEYEVENTF_KEYUP;
        }
        if action.key.is_extended() {
            flags |= KEYEVENTF_EXTENDEDKEY;
        }

        INPUT {
            r#type: INPUT_KEYBOARD,
            Anonymous: INPUT_0 {
                ki: KEYBDINPUT {
                    wVk: VIRTUAL_KEY(action.key.vk_code()),
                    wScan: 0,
                    dwFlags: flags,
                    time: 0,
                    dwExtraInfo: 0,
                },
            },
        }
    }
}
