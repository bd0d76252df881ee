//! Caps Lock / Left Shift remapping state machine
//!
//! Consumes one raw key event at a time and answers with a [`Verdict`]:
//! what to do with the original event plus the keys to inject. The machine
//! never touches the OS itself, so every call is a handful of flag updates.
//!
//! Gestures:
//! - Caps Lock alone: switch layout (Windows+Space picker or Alt+Shift cycle)
//! - Caps Lock + Left Shift, in either order: toggle the real Caps Lock
//! - Alt + Caps Lock: enable or disable the remapper

use serde::{Deserialize, Serialize};

use super::keys::{
    Actions, Disposition, KeyEvent, KeyTransition, SynthKey, SynthKeyAction, Verdict, VirtualKey,
};

/// How a layout switch is requested from the OS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureStyle {
    /// Windows+Space, held while Caps Lock is held
    PopupPicker,
    /// Alt+Shift, tapped when Caps Lock is released
    CycleLayout,
}

impl GestureStyle {
    pub fn is_popup(self) -> bool {
        self == GestureStyle::PopupPicker
    }
}

impl std::fmt::Display for GestureStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GestureStyle::PopupPicker => write!(f, "Win+Space"),
            GestureStyle::CycleLayout => write!(f, "Alt+Shift"),
        }
    }
}

/// Snapshot of the remapper flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemapState {
    /// Remapping is active
    pub enabled: bool,
    /// Caps Lock key-down seen, key-up not yet seen
    pub caps_armed: bool,
    /// Left Shift key-down seen, key-up not yet seen
    pub shift_armed: bool,
    /// A synthesized Windows key press is waiting for its release
    pub win_held: bool,
}

impl Default for RemapState {
    fn default() -> Self {
        Self {
            enabled: true,
            caps_armed: false,
            shift_armed: false,
            win_held: false,
        }
    }
}

/// The remapper. One instance per hook, driven from a single thread.
#[derive(Debug)]
pub struct RemapMachine {
    state: RemapState,
    gesture: GestureStyle,
}

impl RemapMachine {
    pub fn new(gesture: GestureStyle) -> Self {
        Self {
            state: RemapState::default(),
            gesture,
        }
    }

    pub fn state(&self) -> RemapState {
        self.state
    }

    pub fn gesture(&self) -> GestureStyle {
        self.gesture
    }

    pub fn is_enabled(&self) -> bool {
        self.state.enabled
    }

    /// Decide what happens to a single keyboard event
    pub fn handle(&mut self, event: KeyEvent) -> Verdict {
        // Our own injections come back through the hook
        if event.synthetic {
            return Verdict::pass_through();
        }

        match event.key {
            VirtualKey::CapsLock => self.handle_caps_lock(event.transition),
            VirtualKey::LeftShift => self.handle_left_shift(event.transition),
            VirtualKey::Other(_) => Verdict::pass_through(),
        }
    }

    fn handle_caps_lock(&mut self, transition: KeyTransition) -> Verdict {
        let mut emit = Actions::new();

        if transition == KeyTransition::AltDown && !self.state.caps_armed {
            self.state.caps_armed = true;
            self.state.enabled = !self.state.enabled;
            return Verdict::with(Disposition::Suppress, emit);
        }

        if transition == KeyTransition::Up {
            self.state.caps_armed = false;

            if self.state.win_held {
                self.state.win_held = false;
                emit.push(SynthKeyAction::release(SynthKey::LeftWin));
            }

            if self.state.enabled && !self.gesture.is_popup() {
                if self.state.shift_armed {
                    // The chord already toggled Caps Lock; don't cycle too
                    self.state.shift_armed = false;
                } else {
                    push_cycle_layout(&mut emit);
                }
            }
        }

        if !self.state.enabled {
            return Verdict::with(Disposition::PassThrough, emit);
        }

        if transition == KeyTransition::Down && !self.state.caps_armed {
            self.state.caps_armed = true;

            if self.state.shift_armed {
                push_caps_toggle(&mut emit);
            } else if self.gesture.is_popup() {
                self.open_picker(&mut emit);
            }
        }

        Verdict::with(Disposition::Suppress, emit)
    }

    fn handle_left_shift(&mut self, transition: KeyTransition) -> Verdict {
        if transition == KeyTransition::Up {
            // Caps Lock's own release still needs to see the chord
            if !self.state.caps_armed {
                self.state.shift_armed = false;
            }
            return if self.state.enabled {
                Verdict::with(Disposition::Handled, Actions::new())
            } else {
                Verdict::pass_through()
            };
        }

        if !self.state.enabled {
            return Verdict::pass_through();
        }

        let mut emit = Actions::new();

        if transition == KeyTransition::Down && !self.state.shift_armed {
            self.state.shift_armed = true;

            if self.state.caps_armed {
                push_caps_toggle(&mut emit);
                if self.gesture.is_popup() {
                    self.open_picker(&mut emit);
                }
            }
        }

        Verdict::with(Disposition::Handled, emit)
    }

    /// Windows+Space, leaving Windows down until Caps Lock is released
    fn open_picker(&mut self, emit: &mut Actions) {
        if !self.state.win_held {
            emit.push(SynthKeyAction::press(SynthKey::LeftWin));
        }
        emit.push(SynthKeyAction::press(SynthKey::Space));
        emit.push(SynthKeyAction::release(SynthKey::Space));
        self.state.win_held = true;
    }
}

fn push_caps_toggle(emit: &mut Actions) {
    emit.push(SynthKeyAction::press(SynthKey::CapsLock));
    emit.push(SynthKeyAction::release(SynthKey::CapsLock));
}

fn push_cycle_layout(emit: &mut Actions) {
    emit.push(SynthKeyAction::press(SynthKey::Alt));
    emit.push(SynthKeyAction::press(SynthKey::LeftShift));
    emit.push(SynthKeyAction::release(SynthKey::Alt));
    emit.push(SynthKeyAction::release(SynthKey::LeftShift));
}
