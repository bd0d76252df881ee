//! Remapping core
//!
//! Pure decision logic for Caps Lock and Left Shift. The event source feeds
//! it raw key events and applies the returned verdicts; see [`RemapMachine`].

mod keys;
mod machine;

pub use keys::{
    Direction, Disposition, KeyEvent, KeyTransition, SynthKey, SynthKeyAction, VirtualKey,
};
pub use machine::{GestureStyle, RemapMachine};
