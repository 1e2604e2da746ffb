//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use horizon_rwt_core::{PushKey, ServerPushManager};
use parking_lot::Mutex;

/// One call received by [`RecordingPush`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushCall {
    HasRunnables(bool),
    Activate(PushKey),
    Deactivate(PushKey),
}

/// Push manager that records every call it receives.
#[derive(Default)]
pub struct RecordingPush {
    calls: Mutex<Vec<PushCall>>,
    wakes: AtomicUsize,
}

impl RecordingPush {
    pub fn calls(&self) -> Vec<PushCall> {
        self.calls.lock().clone()
    }

    pub fn has_runnables_calls(&self) -> Vec<bool> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                PushCall::HasRunnables(value) => Some(*value),
                _ => None,
            })
            .collect()
    }

    /// Keys activated and not yet deactivated.
    pub fn active_keys(&self) -> Vec<PushKey> {
        let mut active = Vec::new();
        for call in self.calls.lock().iter() {
            match call {
                PushCall::Activate(key) => active.push(*key),
                PushCall::Deactivate(key) => active.retain(|k| k != key),
                PushCall::HasRunnables(_) => {}
            }
        }
        active
    }

    pub fn wakes(&self) -> usize {
        self.wakes.load(Ordering::SeqCst)
    }
}

impl ServerPushManager for RecordingPush {
    fn set_has_runnables(&self, has_runnables: bool) {
        self.calls.lock().push(PushCall::HasRunnables(has_runnables));
    }

    fn activate_server_push_for(&self, key: PushKey) {
        self.calls.lock().push(PushCall::Activate(key));
    }

    fn deactivate_server_push_for(&self, key: PushKey) {
        self.calls.lock().push(PushCall::Deactivate(key));
    }

    fn wake_client(&self) {
        self.wakes.fetch_add(1, Ordering::SeqCst);
    }
}
