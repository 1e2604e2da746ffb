//! The UI-thread message queue.
//!
//! Any thread may submit work with [`Synchronizer::async_exec`] (fire and
//! forget) or [`Synchronizer::sync_exec`] (block until done). The UI thread
//! drains the queue with [`Synchronizer::run_async_messages`], normally from
//! `Display::read_and_dispatch`.
//!
//! Every transition of the queue between empty and non-empty is reported to
//! the session's [`ServerPushManager`](crate::ServerPushManager) while the
//! message lock is held, so the client always knows whether work is pending.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, ThreadId};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::config::{NullRunnablePolicy, SynchronizerConfig};
use crate::device::Device;
use crate::error::{Result, RwtError, TaskFailure};
use crate::logging::targets;
use crate::runnable::{Runnable, RunnableLock};

struct MessageQueue {
    messages: VecDeque<Arc<RunnableLock>>,
    /// Set by `release_synchronizer`; no further messages are accepted.
    released: bool,
    /// A wake-up arrived while no message was queued; consumed by the next
    /// `wait_for_messages`.
    wake_pending: bool,
}

/// Queue of runnables awaiting execution on the UI thread.
pub struct Synchronizer {
    device: Arc<Device>,
    config: SynchronizerConfig,
    queue: Mutex<MessageQueue>,
    /// Signalled whenever a message is added or the queue is released.
    message_added: Condvar,
    /// Thread waiting on the `sync_exec` message currently running.
    sync_thread: Mutex<Option<ThreadId>>,
}

static_assertions::assert_impl_all!(Synchronizer: Send, Sync);

impl Synchronizer {
    /// Create a synchronizer for `device`.
    pub fn new(device: Arc<Device>, config: SynchronizerConfig) -> Self {
        let messages = VecDeque::with_capacity(config.grow_size);
        Self {
            device,
            config,
            queue: Mutex::new(MessageQueue {
                messages,
                released: false,
                wake_pending: false,
            }),
            message_added: Condvar::new(),
            sync_thread: Mutex::new(None),
        }
    }

    /// Queue `runnable` for the UI thread and return immediately.
    ///
    /// A missing runnable is handled per [`NullRunnablePolicy`].
    pub fn async_exec(&self, runnable: Option<Runnable>) {
        let runnable = match (runnable, self.config.null_runnable) {
            (Some(runnable), _) => runnable,
            (None, NullRunnablePolicy::Wake) => {
                self.wake();
                return;
            }
            (None, NullRunnablePolicy::Enqueue) => Runnable::noop(),
        };
        self.add_last(Arc::new(RunnableLock::new(Some(runnable), None)));
    }

    /// Run `runnable` on the UI thread and wait for it to finish.
    ///
    /// On the UI thread itself the runnable runs inline and a panic
    /// propagates to the caller. From any other thread the call blocks until
    /// the UI thread has run the message (or the synchronizer was released);
    /// a panic is then reported as [`RwtError::FailedExec`].
    pub fn sync_exec(&self, runnable: Option<Runnable>) -> Result<()> {
        if self.device.is_disposed() {
            return Err(RwtError::DeviceDisposed);
        }
        if self.device.is_valid_thread() {
            if let Some(runnable) = runnable {
                runnable.run();
            }
            return Ok(());
        }

        let lock = Arc::new(RunnableLock::new(runnable, Some(thread::current().id())));
        if !self.add_last(lock.clone()) {
            return Err(RwtError::DeviceDisposed);
        }
        lock.wait_until_done();
        match lock.failure() {
            Some(failure) => Err(RwtError::FailedExec(failure)),
            None => Ok(()),
        }
    }

    /// Wake a UI thread blocked in `wait_for_messages` and the client,
    /// without queueing anything.
    fn wake(&self) {
        {
            let mut queue = self.queue.lock();
            queue.wake_pending = true;
            self.message_added.notify_all();
        }
        self.device.wake_thread();
    }

    fn add_last(&self, lock: Arc<RunnableLock>) -> bool {
        let wake = {
            let mut queue = self.queue.lock();
            if queue.released {
                tracing::debug!(target: targets::SYNCHRONIZER, "dropping message for released synchronizer");
                return false;
            }
            if queue.messages.len() == queue.messages.capacity() {
                queue.messages.reserve_exact(self.config.grow_size);
            }
            queue.messages.push_back(lock);
            let became_non_empty = queue.messages.len() == 1;
            if became_non_empty {
                self.device.set_has_runnables(true);
            }
            self.message_added.notify_all();
            became_non_empty
        };
        tracing::trace!(target: targets::SYNCHRONIZER, wake, "queued message");
        if wake {
            self.device.wake_thread();
        }
        true
    }

    fn remove_first(&self) -> Option<Arc<RunnableLock>> {
        let mut queue = self.queue.lock();
        let lock = queue.messages.pop_front()?;
        if queue.messages.is_empty() {
            self.device.set_has_runnables(false);
            if queue.messages.capacity() > self.config.message_limit {
                queue.messages.shrink_to(self.config.grow_size);
            }
        }
        Some(lock)
    }

    /// Run the next queued message, or every queued message when `all` is set.
    ///
    /// Returns whether anything ran. A panic in an async message is returned
    /// as [`RwtError::FailedExec`] after the remaining bookkeeping is done; a
    /// panic in a sync message is handed to its waiter instead. A
    /// [`ThreadDeath`](crate::ThreadDeath) panic is recorded on the message
    /// and then resumed.
    #[tracing::instrument(skip(self), target = "horizon_rwt_core::synchronizer", level = "trace")]
    pub fn run_async_messages(&self, all: bool) -> Result<bool> {
        let mut ran = false;
        while let Some(lock) = self.remove_first() {
            ran = true;
            *self.sync_thread.lock() = lock.thread();
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| lock.run()));
            *self.sync_thread.lock() = None;

            if let Err(payload) = outcome {
                let failure = TaskFailure::from_panic(payload.as_ref());
                lock.record_failure(failure.clone());
                lock.notify_all();
                if failure.is_fatal() {
                    tracing::debug!(target: targets::SYNCHRONIZER, "resuming thread death");
                    panic::resume_unwind(payload);
                }
                if lock.thread().is_none() {
                    return Err(RwtError::FailedExec(failure));
                }
                tracing::debug!(
                    target: targets::SYNCHRONIZER,
                    error = %failure,
                    "sync message failed, reporting to waiter"
                );
            } else {
                lock.notify_all();
            }

            if !all {
                break;
            }
        }
        Ok(ran)
    }

    /// Number of queued messages.
    pub fn message_count(&self) -> usize {
        self.queue.lock().messages.len()
    }

    /// Block until a message is queued, the thread is woken, the
    /// synchronizer is released, or `timeout` elapses. Returns whether
    /// messages are pending.
    ///
    /// A wake-up that arrived since the previous call ends the wait at once.
    pub fn wait_for_messages(&self, timeout: Duration) -> bool {
        let mut queue = self.queue.lock();
        if queue.messages.is_empty() && !queue.released && !queue.wake_pending {
            self.message_added.wait_for(&mut queue, timeout);
        }
        queue.wake_pending = false;
        !queue.messages.is_empty()
    }

    /// The thread blocked on the `sync_exec` message currently running.
    pub fn sync_thread(&self) -> Option<ThreadId> {
        *self.sync_thread.lock()
    }

    /// Drop every pending message and refuse further work.
    ///
    /// Threads blocked in `sync_exec` are released without their runnable
    /// having run.
    pub fn release_synchronizer(&self) {
        let drained: Vec<_> = {
            let mut queue = self.queue.lock();
            queue.released = true;
            let drained: Vec<_> = queue.messages.drain(..).collect();
            if !drained.is_empty() {
                self.device.set_has_runnables(false);
            }
            queue.messages.shrink_to(self.config.grow_size);
            self.message_added.notify_all();
            drained
        };
        tracing::debug!(target: targets::SYNCHRONIZER, dropped = drained.len(), "released synchronizer");
        for lock in drained {
            lock.release();
        }
    }

    /// Move every pending message to `other`, preserving order.
    pub fn move_all_events_to(&self, other: &Synchronizer) {
        self.transfer_to(other, false);
    }

    /// Move every pending message to `other` and refuse further work, in one
    /// step. Used when a display replaces this synchronizer.
    pub(crate) fn retire_into(&self, other: &Synchronizer) {
        self.transfer_to(other, true);
    }

    fn transfer_to(&self, other: &Synchronizer, retire: bool) {
        let moved: Vec<_> = {
            let mut queue = self.queue.lock();
            queue.released |= retire;
            let moved: Vec<_> = queue.messages.drain(..).collect();
            if !moved.is_empty() {
                self.device.set_has_runnables(false);
            }
            if retire {
                self.message_added.notify_all();
            }
            moved
        };
        tracing::debug!(target: targets::SYNCHRONIZER, moved = moved.len(), retire, "moving pending messages");
        for lock in moved {
            if !other.add_last(lock.clone()) {
                lock.release();
            }
        }
    }
}

impl std::fmt::Debug for Synchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Synchronizer")
            .field("message_count", &self.message_count())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
