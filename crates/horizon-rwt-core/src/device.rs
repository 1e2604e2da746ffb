//! Per-session device state: the UI thread binding and the disposed flag.

use std::sync::Arc;
use std::thread::{self, ThreadId};

use parking_lot::{Mutex, MutexGuard};

use crate::error::{Result, RwtError};
use crate::logging::targets;
use crate::push::{ServerPushManager, UiSession};

pub(crate) struct DeviceState {
    pub(crate) thread: Option<ThreadId>,
    pub(crate) disposed: bool,
}

/// The device underlying a display.
///
/// All state changes go through the device lock, which is also what
/// serializes `async_exec` against disposal.
pub struct Device {
    state: Mutex<DeviceState>,
    session: Arc<dyn UiSession>,
    push: Arc<dyn ServerPushManager>,
}

static_assertions::assert_impl_all!(Device: Send, Sync);

impl Device {
    /// Create a device bound to the calling thread.
    pub fn new(session: Arc<dyn UiSession>, push: Arc<dyn ServerPushManager>) -> Self {
        Self {
            state: Mutex::new(DeviceState {
                thread: Some(thread::current().id()),
                disposed: false,
            }),
            session,
            push,
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, DeviceState> {
        self.state.lock()
    }

    /// The session collaborator.
    pub fn session(&self) -> &Arc<dyn UiSession> {
        &self.session
    }

    /// The push collaborator.
    pub fn push(&self) -> &Arc<dyn ServerPushManager> {
        &self.push
    }

    /// Bind the calling thread as the UI thread.
    pub fn attach_thread(&self) {
        let id = thread::current().id();
        self.state.lock().thread = Some(id);
        tracing::debug!(target: targets::DISPLAY, thread = ?id, "attached UI thread");
    }

    /// Unbind the UI thread.
    pub fn detach_thread(&self) {
        self.state.lock().thread = None;
        tracing::debug!(target: targets::DISPLAY, "detached UI thread");
    }

    /// The bound UI thread, if any.
    pub fn thread(&self) -> Option<ThreadId> {
        self.state.lock().thread
    }

    /// Whether the calling thread is the bound UI thread.
    pub fn is_valid_thread(&self) -> bool {
        self.thread() == Some(thread::current().id())
    }

    pub fn is_disposed(&self) -> bool {
        self.state.lock().disposed
    }

    pub(crate) fn mark_disposed(&self) {
        self.state.lock().disposed = true;
    }

    /// Fail unless called on the UI thread of a live device.
    ///
    /// A foreign thread is reported before disposal.
    pub fn check_device(&self) -> Result<()> {
        let state = self.state.lock();
        if state.thread != Some(thread::current().id()) {
            return Err(RwtError::InvalidThreadAccess);
        }
        if state.disposed {
            return Err(RwtError::DeviceDisposed);
        }
        Ok(())
    }

    /// Ask the client to send a request.
    pub fn wake_thread(&self) {
        let push = &self.push;
        self.session.exec(&mut || push.wake_client());
    }

    /// Forward a queue empty/non-empty transition to the push manager.
    pub fn set_has_runnables(&self, has_runnables: bool) {
        let push = &self.push;
        self.session
            .exec(&mut || push.set_has_runnables(has_runnables));
    }
}

impl std::fmt::Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Device")
            .field("thread", &state.thread)
            .field("disposed", &state.disposed)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::push::{DirectSession, NoopPushManager};

    fn device() -> Device {
        Device::new(Arc::new(DirectSession), Arc::new(NoopPushManager))
    }

    #[test]
    fn test_new_device_bound_to_creator() {
        let device = device();
        assert!(device.is_valid_thread());
        assert!(device.check_device().is_ok());
    }

    #[test]
    fn test_check_device_reports_thread_before_disposal() {
        let device = Arc::new(device());
        device.mark_disposed();
        assert!(matches!(device.check_device(), Err(RwtError::DeviceDisposed)));

        let remote = device.clone();
        let result = thread::spawn(move || remote.check_device()).join().unwrap();
        assert!(matches!(result, Err(RwtError::InvalidThreadAccess)));
    }

    #[test]
    fn test_detach_and_attach() {
        let device = device();
        device.detach_thread();
        assert_eq!(device.thread(), None);
        assert!(matches!(device.check_device(), Err(RwtError::InvalidThreadAccess)));
        device.attach_thread();
        assert!(device.is_valid_thread());
    }
}
