//! Collaborators a session hands to its display.
//!
//! The server push manager keeps the client's push channel open while work is
//! pending, and the UI session runs notifications with the session's context
//! bound. Both are injected per display, never looked up globally.

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_PUSH_KEY: AtomicU64 = AtomicU64::new(1);

/// Opaque key under which a pending timer task holds the push channel open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PushKey(u64);

impl PushKey {
    /// Allocate a fresh, process-unique key.
    pub fn next() -> Self {
        Self(NEXT_PUSH_KEY.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw key value.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// Keeps the client informed that server-side work is pending.
pub trait ServerPushManager: Send + Sync {
    /// Called on every empty/non-empty transition of the message queue.
    fn set_has_runnables(&self, has_runnables: bool);

    /// Hold the push channel open on behalf of `key`.
    fn activate_server_push_for(&self, key: PushKey);

    /// Release the hold taken for `key`.
    fn deactivate_server_push_for(&self, key: PushKey);

    /// Ask the client to send a request so the UI thread can run.
    fn wake_client(&self);
}

/// Runs a task with the session's context bound.
pub trait UiSession: Send + Sync {
    fn exec(&self, task: &mut dyn FnMut());
}

/// A session that runs tasks inline.
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectSession;

impl UiSession for DirectSession {
    fn exec(&self, task: &mut dyn FnMut()) {
        task()
    }
}

/// A push manager that ignores every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPushManager;

impl ServerPushManager for NoopPushManager {
    fn set_has_runnables(&self, _has_runnables: bool) {}
    fn activate_server_push_for(&self, _key: PushKey) {}
    fn deactivate_server_push_for(&self, _key: PushKey) {}
    fn wake_client(&self) {}
}
