//! Recording key injector for unit tests
//!
//! Stores every injected batch in memory instead of calling `SendInput`,
//! so tests can assert on exactly what reached the "system" and in what
//! order. Set `should_fail` to exercise the error path.

use std::sync::Mutex;

use super::inject::{InjectError, KeyInjector};
use crate::remap::SynthKeyAction;

#[derive(Debug, Default)]
pub struct RecordingInjector {
    /// One entry per `inject` call
    pub batches: Mutex<Vec<Vec<SynthKeyAction>>>,
    /// When `true`, `inject` records nothing and fails
    pub should_fail: bool,
}

impl RecordingInjector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    /// All injected actions, flattened in injection order
    pub fn injected(&self) -> Vec<SynthKeyAction> {
        self.batches.lock().unwrap().iter().flatten().copied().collect()
    }
}

impl KeyInjector for RecordingInjector {
    fn inject(&self, actions: &[SynthKeyAction]) -> Result<(), InjectError> {
        if self.should_fail {
            return Err(InjectError::Platform("mock failure".to_string()));
        }
        self.batches.lock().unwrap().push(actions.to_vec());
        Ok(())
    }
}
