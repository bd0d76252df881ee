//! Key event and verdict types exchanged with the event source
//!
//! Virtual key codes are the Windows `VK_*` values; nothing in this file
//! touches the Windows API, so the remapper can be exercised anywhere.

use smallvec::SmallVec;

/// Windows virtual key codes used by the remapper
pub mod vk {
    /// VK_CAPITAL
    pub const CAPS_LOCK: u32 = 0x14;
    /// VK_LSHIFT
    pub const LEFT_SHIFT: u32 = 0xA0;
    /// VK_MENU
    pub const ALT: u32 = 0x12;
    /// VK_LWIN
    pub const LEFT_WIN: u32 = 0x5B;
    /// VK_SPACE
    pub const SPACE: u32 = 0x20;
}

/// The physical key an event refers to, as far as the remapper cares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VirtualKey {
    CapsLock,
    LeftShift,
    /// Any other key, carrying its raw virtual key code
    Other(u32),
}

impl VirtualKey {
    pub fn from_vk_code(code: u32) -> Self {
        match code {
            vk::CAPS_LOCK => Self::CapsLock,
            vk::LEFT_SHIFT => Self::LeftShift,
            other => Self::Other(other),
        }
    }
}

/// What happened to the key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTransition {
    /// Plain key-down, including auto-repeat
    Down,
    /// System key-down, reported while Alt is held
    AltDown,
    /// Any key release
    Up,
}

/// A single raw keyboard event delivered by the event source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: VirtualKey,
    pub transition: KeyTransition,
    /// The event was injected by software rather than typed
    pub synthetic: bool,
}

impl KeyEvent {
    /// A physical key event
    pub fn new(key: VirtualKey, transition: KeyTransition) -> Self {
        Self {
            key,
            transition,
            synthetic: false,
        }
    }

    /// An injected key event
    pub fn synthetic(key: VirtualKey, transition: KeyTransition) -> Self {
        Self {
            key,
            transition,
            synthetic: true,
        }
    }
}

/// Keys the remapper may synthesize
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthKey {
    CapsLock,
    LeftShift,
    Alt,
    LeftWin,
    Space,
}

impl SynthKey {
    pub fn vk_code(self) -> u16 {
        let code = match self {
            SynthKey::CapsLock => vk::CAPS_LOCK,
            SynthKey::LeftShift => vk::LEFT_SHIFT,
            SynthKey::Alt => vk::ALT,
            SynthKey::LeftWin => vk::LEFT_WIN,
            SynthKey::Space => vk::SPACE,
        };
        code as u16
    }

    /// Keys that must be injected with the extended-key flag
    pub fn is_extended(self) -> bool {
        matches!(self, SynthKey::LeftWin)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Press,
    Release,
}

/// One key press or release the event source must inject
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SynthKeyAction {
    pub key: SynthKey,
    pub direction: Direction,
}

impl SynthKeyAction {
    pub fn press(key: SynthKey) -> Self {
        Self {
            key,
            direction: Direction::Press,
        }
    }

    pub fn release(key: SynthKey) -> Self {
        Self {
            key,
            direction: Direction::Release,
        }
    }
}

/// Ordered actions for one verdict. No verdict carries more than five.
pub type Actions = SmallVec<[SynthKeyAction; 6]>;

/// What the event source does with the original event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Forward along the hook chain untouched
    PassThrough,
    /// Deliver to the system but skip the remaining hooks
    Handled,
    /// Swallow the event
    Suppress,
}

/// The remapper's decision for one event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub disposition: Disposition,
    pub emit: Actions,
}

impl Verdict {
    pub fn pass_through() -> Self {
        Self::with(Disposition::PassThrough, Actions::new())
    }

    pub fn with(disposition: Disposition, emit: Actions) -> Self {
        Self { disposition, emit }
    }

    /// Whether the original event is kept from the system
    pub fn suppresses(&self) -> bool {
        self.disposition == Disposition::Suppress
    }

    /// Forwarded untouched with nothing injected
    pub fn is_untouched(&self) -> bool {
        self.disposition == Disposition::PassThrough && self.emit.is_empty()
    }
}
