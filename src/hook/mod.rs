//! Keyboard hook module
//!
//! The event source side of the remapper: receives raw keyboard events from
//! a WH_KEYBOARD_LL hook, feeds them to the remapper and injects the keys it
//! asks for.

mod dispatch;
mod inject;
#[cfg(target_os = "windows")]
mod listener;
#[cfg(test)]
mod mock;

#[cfg(target_os = "windows")]
pub use listener::KeyboardHook;
