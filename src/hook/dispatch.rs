//! Glue between the keyboard hook and the remapper
//!
//! Runs on the hook thread for every keyboard event: asks the machine for
//! a verdict, injects the requested keys, and reports notable changes
//! without ever waiting on the receiving side.

use tokio::sync::mpsc;
use tracing::{trace, warn};

use super::inject::KeyInjector;
use crate::events::RemapEvent;
use crate::remap::{Disposition, KeyEvent, RemapMachine};

pub struct Dispatcher<I: KeyInjector> {
    machine: RemapMachine,
    injector: I,
    event_tx: mpsc::Sender<RemapEvent>,
}

impl<I: KeyInjector> Dispatcher<I> {
    pub fn new(machine: RemapMachine, injector: I, event_tx: mpsc::Sender<RemapEvent>) -> Self {
        Self {
            machine,
            injector,
            event_tx,
        }
    }

    #[cfg(test)]
    pub fn machine(&self) -> &RemapMachine {
        &self.machine
    }

    /// Handle one event; the returned disposition is applied by the hook
    pub fn dispatch(&mut self, event: KeyEvent) -> Disposition {
        let was_enabled = self.machine.is_enabled();
        let verdict = self.machine.handle(event);

        trace!(
            key = ?event.key,
            transition = ?event.transition,
            synthetic = event.synthetic,
            disposition = ?verdict.disposition,
            actions = verdict.emit.len(),
            "key event"
        );

        // Injection happens before the hook returns, so ordering holds
        let injected = verdict.emit.is_empty()
            || match self.injector.inject(&verdict.emit) {
                Ok(()) => true,
                Err(e) => {
                    warn!(error = %e, "failed to inject keys");
                    false
                }
            };

        let enabled = self.machine.is_enabled();
        if enabled != was_enabled {
            self.notify(RemapEvent::RemapperToggled { enabled });
        }
        if injected {
            for event in RemapEvent::from_actions(&verdict.emit) {
                self.notify(event);
            }
        }

        verdict.disposition
    }

    fn notify(&self, event: RemapEvent) {
        if let Err(e) = self.event_tx.try_send(event) {
            warn!(error = %e, "dropping remap event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hook::mock::RecordingInjector;
    use crate::remap::{GestureStyle, KeyTransition, SynthKey, SynthKeyAction, VirtualKey};

    fn dispatcher(
        gesture: GestureStyle,
        injector: RecordingInjector,
    ) -> (Dispatcher<RecordingInjector>, mpsc::Receiver<RemapEvent>) {
        let (tx, rx) = mpsc::channel(16);
        (Dispatcher::new(RemapMachine::new(gesture), injector, tx), rx)
    }

    fn caps(transition: KeyTransition) -> KeyEvent {
        KeyEvent::new(VirtualKey::CapsLock, transition)
    }

    fn drain(rx: &mut mpsc::Receiver<RemapEvent>) -> Vec<RemapEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn test_injects_actions_in_order() {
        let (mut d, mut rx) = dispatcher(GestureStyle::CycleLayout, RecordingInjector::new());

        assert_eq!(d.dispatch(caps(KeyTransition::Down)), Disposition::Suppress);
        assert_eq!(d.dispatch(caps(KeyTransition::Up)), Disposition::Suppress);

        // Nothing is injected for the key-down, one batch for the release
        assert_eq!(d.injector.batches.lock().unwrap().len(), 1);
        assert_eq!(
            d.injector.injected(),
            vec![
                SynthKeyAction::press(SynthKey::Alt),
                SynthKeyAction::press(SynthKey::LeftShift),
                SynthKeyAction::release(SynthKey::Alt),
                SynthKeyAction::release(SynthKey::LeftShift),
            ]
        );
        assert_eq!(
            drain(&mut rx),
            vec![RemapEvent::LayoutSwitched {
                gesture: GestureStyle::CycleLayout
            }]
        );
    }

    #[test]
    fn test_reports_toggle() {
        let (mut d, mut rx) = dispatcher(GestureStyle::PopupPicker, RecordingInjector::new());

        assert_eq!(d.dispatch(caps(KeyTransition::AltDown)), Disposition::Suppress);
        assert!(!d.machine().is_enabled());
        assert_eq!(drain(&mut rx), vec![RemapEvent::RemapperToggled { enabled: false }]);
        assert!(d.injector.injected().is_empty());
    }

    #[test]
    fn test_untracked_key_untouched() {
        let (mut d, mut rx) = dispatcher(GestureStyle::PopupPicker, RecordingInjector::new());

        let event = KeyEvent::new(VirtualKey::Other(0x41), KeyTransition::Down);
        assert_eq!(d.dispatch(event), Disposition::PassThrough);
        assert!(d.injector.batches.lock().unwrap().is_empty());
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_injection_failure_keeps_disposition() {
        let (mut d, mut rx) = dispatcher(GestureStyle::PopupPicker, RecordingInjector::failing());

        assert_eq!(d.dispatch(caps(KeyTransition::Down)), Disposition::Suppress);
        assert!(d.machine().state().win_held);
        // Nothing reached the system, so nothing is reported
        assert!(drain(&mut rx).is_empty());

        assert_eq!(d.dispatch(caps(KeyTransition::Up)), Disposition::Suppress);
        assert!(!d.machine().state().win_held);
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_toggle_reported_despite_injection_failure() {
        let (mut d, mut rx) = dispatcher(GestureStyle::CycleLayout, RecordingInjector::failing());

        d.dispatch(caps(KeyTransition::AltDown));
        assert_eq!(drain(&mut rx), vec![RemapEvent::RemapperToggled { enabled: false }]);
    }

    #[test]
    fn test_full_channel_does_not_block() {
        let (tx, mut rx) = mpsc::channel(1);
        let mut d = Dispatcher::new(
            RemapMachine::new(GestureStyle::PopupPicker),
            RecordingInjector::new(),
            tx,
        );

        d.dispatch(caps(KeyTransition::Down));
        d.dispatch(caps(KeyTransition::Up));

        // Second notification was dropped, injection still happened
        assert_eq!(drain(&mut rx).len(), 1);
        assert_eq!(d.injector.injected().len(), 4);
    }

    #[test]
    fn test_closed_channel_is_tolerated() {
        let (mut d, rx) = dispatcher(GestureStyle::CycleLayout, RecordingInjector::new());
        drop(rx);

        assert_eq!(d.dispatch(caps(KeyTransition::Down)), Disposition::Suppress);
        assert_eq!(d.dispatch(caps(KeyTransition::Up)), Disposition::Suppress);
        assert_eq!(d.injector.injected().len(), 4);
    }

    #[test]
    fn test_notifications_arrive_async() {
        let (mut d, mut rx) = dispatcher(GestureStyle::CycleLayout, RecordingInjector::new());
        d.dispatch(KeyEvent::new(VirtualKey::LeftShift, KeyTransition::Down));
        d.dispatch(caps(KeyTransition::Down));

        let event = tokio_test::block_on(rx.recv());
        assert_eq!(event, Some(RemapEvent::CapsLockToggled));
    }
}
