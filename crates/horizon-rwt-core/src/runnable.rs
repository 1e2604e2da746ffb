//! Runnables and the per-message completion lock.
//!
//! A [`Runnable`] is a shareable unit of UI work. The synchronizer wraps each
//! submitted runnable in a [`RunnableLock`], which is what a `sync_exec`
//! caller blocks on while the UI thread gets around to running it.

use std::fmt;
use std::sync::Arc;
use std::thread::ThreadId;

use parking_lot::{Condvar, Mutex};

use crate::error::TaskFailure;

/// A cloneable handle to a unit of work.
///
/// Two handles are the same runnable when they share an allocation, i.e. one
/// was cloned from the other. The optional name identifies the runnable
/// across a scheduler snapshot and restore.
#[derive(Clone)]
pub struct Runnable {
    inner: Arc<dyn Fn() + Send + Sync>,
    name: Option<Arc<str>>,
}

impl Runnable {
    /// Wrap a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(f),
            name: None,
        }
    }

    /// Wrap a closure under a stable name.
    pub fn named<F>(name: impl Into<Arc<str>>, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(f),
            name: Some(name.into()),
        }
    }

    /// A runnable that does nothing.
    pub fn noop() -> Self {
        Self::new(|| {})
    }

    /// Run the work on the calling thread.
    pub fn run(&self) {
        (self.inner)()
    }

    /// The stable name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Whether both handles refer to the same runnable.
    pub fn ptr_eq(&self, other: &Runnable) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Runnable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runnable")
            .field("name", &self.name)
            .field("ptr", &Arc::as_ptr(&self.inner).cast::<()>())
            .finish()
    }
}

struct LockState {
    task: Option<Runnable>,
    started: bool,
    failure: Option<TaskFailure>,
}

/// Completion state of one queued message.
///
/// The lock is done once its task has run (or was released without running)
/// or a failure was recorded. A `sync_exec` caller waits on it through
/// [`wait_until_done`](Self::wait_until_done); the UI thread wakes it with
/// [`notify_all`](Self::notify_all).
pub struct RunnableLock {
    state: Mutex<LockState>,
    condvar: Condvar,
    thread: Option<ThreadId>,
}

static_assertions::assert_impl_all!(RunnableLock: Send, Sync);

impl RunnableLock {
    /// A lock for `task`, waited on by `thread` (`None` for async messages).
    pub fn new(task: Option<Runnable>, thread: Option<ThreadId>) -> Self {
        Self {
            state: Mutex::new(LockState {
                task,
                started: false,
                failure: None,
            }),
            condvar: Condvar::new(),
            thread,
        }
    }

    /// The thread blocked on this lock, if it came from `sync_exec`.
    pub fn thread(&self) -> Option<ThreadId> {
        self.thread
    }

    /// Whether the task has run, was released or failed.
    pub fn done(&self) -> bool {
        let state = self.state.lock();
        state.task.is_none() || state.failure.is_some()
    }

    /// Run the task at most once, then clear it.
    ///
    /// A panic inside the task is not caught here. The task stays set in that
    /// case; the lock becomes done once the caller records the failure.
    pub fn run(&self) {
        let task = {
            let mut state = self.state.lock();
            if state.started {
                return;
            }
            state.started = true;
            state.task.clone()
        };
        if let Some(task) = task {
            task.run();
        }
        self.state.lock().task = None;
    }

    /// Store the failure of a task that panicked in [`run`](Self::run).
    pub fn record_failure(&self, failure: TaskFailure) {
        self.state.lock().failure = Some(failure);
    }

    /// The failure recorded while running, if any.
    pub fn failure(&self) -> Option<TaskFailure> {
        self.state.lock().failure.clone()
    }

    /// Wake every thread waiting on this lock.
    pub fn notify_all(&self) {
        let _state = self.state.lock();
        self.condvar.notify_all();
    }

    /// Block until the lock is done. Spurious wakeups resume the wait.
    pub fn wait_until_done(&self) {
        let mut state = self.state.lock();
        while state.task.is_some() && state.failure.is_none() {
            self.condvar.wait(&mut state);
        }
    }

    /// Complete the lock without running its task and wake the waiter.
    pub fn release(&self) {
        let mut state = self.state.lock();
        state.started = true;
        state.task = None;
        self.condvar.notify_all();
    }
}

impl fmt::Debug for RunnableLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunnableLock")
            .field("thread", &self.thread)
            .field("done", &self.done())
            .finish()
    }
}
