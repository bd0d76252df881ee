//! Notifications about what the remapper did
//!
//! Derived on the hook thread from each verdict and drained by an async
//! task on the main runtime, which logs them.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::info;

use crate::remap::{Direction, GestureStyle, SynthKey, SynthKeyAction};

/// Events reported by the keyboard hook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RemapEvent {
    /// Remapping was switched on or off with Alt+Caps Lock
    RemapperToggled {
        enabled: bool,
    },

    /// A layout switch gesture was sent to the system
    LayoutSwitched {
        gesture: GestureStyle,
    },

    /// The real Caps Lock state was toggled by the Caps Lock + Shift chord
    CapsLockToggled,

    /// The held Windows key of the layout picker was released
    PickerClosed,
}

impl RemapEvent {
    /// Notifications implied by a list of injected actions
    pub fn from_actions(actions: &[SynthKeyAction]) -> impl Iterator<Item = RemapEvent> + '_ {
        actions.iter().filter_map(|action| match (action.key, action.direction) {
            (SynthKey::CapsLock, Direction::Press) => Some(RemapEvent::CapsLockToggled),
            (SynthKey::Space, Direction::Press) => Some(RemapEvent::LayoutSwitched {
                gesture: GestureStyle::PopupPicker,
            }),
            (SynthKey::Alt, Direction::Press) => Some(RemapEvent::LayoutSwitched {
                gesture: GestureStyle::CycleLayout,
            }),
            (SynthKey::LeftWin, Direction::Release) => Some(RemapEvent::PickerClosed),
            _ => None,
        })
    }
}

impl std::fmt::Display for RemapEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemapEvent::RemapperToggled { enabled: true } => write!(f, "REMAPPER_ENABLED"),
            RemapEvent::RemapperToggled { enabled: false } => write!(f, "REMAPPER_DISABLED"),
            RemapEvent::LayoutSwitched { gesture } => write!(f, "LAYOUT_SWITCHED ({})", gesture),
            RemapEvent::CapsLockToggled => write!(f, "CAPS_LOCK_TOGGLED"),
            RemapEvent::PickerClosed => write!(f, "PICKER_CLOSED"),
        }
    }
}

/// Log notifications until every sender is gone. Returns how many were seen.
pub async fn pump(mut rx: mpsc::Receiver<RemapEvent>) -> usize {
    let mut seen = 0;
    while let Some(event) = rx.recv().await {
        seen += 1;
        match &event {
            RemapEvent::RemapperToggled { enabled } => {
                info!(enabled, "switchy has been {}", if *enabled { "enabled" } else { "disabled" });
            }
            other => info!(event = %other, "remap event"),
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = RemapEvent::LayoutSwitched {
            gesture: GestureStyle::CycleLayout,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("layout_switched"));
        assert!(json.contains("cycle_layout"));
    }

    #[test]
    fn test_event_deserialization() {
        let json = r#"{"type":"remapper_toggled","enabled":false}"#;
        let event: RemapEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event, RemapEvent::RemapperToggled { enabled: false });
    }

    #[test]
    fn test_from_actions() {
        let actions = [
            SynthKeyAction::press(SynthKey::CapsLock),
            SynthKeyAction::release(SynthKey::CapsLock),
            SynthKeyAction::press(SynthKey::Space),
            SynthKeyAction::release(SynthKey::Space),
            SynthKeyAction::release(SynthKey::LeftWin),
        ];
        let events: Vec<_> = RemapEvent::from_actions(&actions).collect();
        assert_eq!(
            events,
            vec![
                RemapEvent::CapsLockToggled,
                RemapEvent::LayoutSwitched {
                    gesture: GestureStyle::PopupPicker
                },
                RemapEvent::PickerClosed,
            ]
        );
    }

    #[test]
    fn test_cycle_layout_reported_once() {
        let actions = [
            SynthKeyAction::press(SynthKey::Alt),
            SynthKeyAction::press(SynthKey::LeftShift),
            SynthKeyAction::release(SynthKey::Alt),
            SynthKeyAction::release(SynthKey::LeftShift),
        ];
        assert_eq!(RemapEvent::from_actions(&actions).count(), 1);
    }

    #[tokio::test]
    async fn test_pump_drains_until_closed() {
        let (tx, rx) = mpsc::channel(4);
        tx.send(RemapEvent::CapsLockToggled).await.unwrap();
        tx.send(RemapEvent::RemapperToggled { enabled: false }).await.unwrap();
        drop(tx);

        assert_eq!(pump(rx).await, 2);
    }
}
