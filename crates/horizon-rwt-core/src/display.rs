//! The per-session display.
//!
//! A [`Display`] ties together everything one UI session needs on the server:
//! the UI thread binding, the message queue other threads post work to, the
//! delayed-execution scheduler, and the display-level listener and filter
//! tables.
//!
//! # Threading
//!
//! Most operations must be called on the UI thread that created (or was
//! attached to) the display and fail with [`RwtError::InvalidThreadAccess`]
//! otherwise. The exceptions are [`async_exec`](Display::async_exec),
//! [`sync_exec`](Display::sync_exec) and [`wake`](Display::wake), which exist
//! precisely so other threads can reach the UI thread.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicBool, Ordering};
//! use horizon_rwt_core::{Display, Runnable};
//!
//! let display = Display::builder().build();
//! let ran = Arc::new(AtomicBool::new(false));
//!
//! let flag = ran.clone();
//! let worker = {
//!     let display = display.clone();
//!     std::thread::spawn(move || {
//!         display
//!             .async_exec(Some(Runnable::new(move || flag.store(true, Ordering::SeqCst))))
//!             .unwrap();
//!     })
//! };
//! worker.join().unwrap();
//!
//! while display.read_and_dispatch().unwrap() {}
//! assert!(ran.load(Ordering::SeqCst));
//! display.dispose().unwrap();
//! ```

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, OnceLock, Weak};
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::config::{DisplayConfig, NullRunnablePolicy, SynchronizerConfig, TimerConfig};
use crate::device::Device;
use crate::error::{Result, RwtError, TaskFailure};
use crate::event::{Event, EventType};
use crate::event_table::EventTable;
use crate::listener::Listener;
use crate::logging::{SessionSpan, targets};
use crate::push::{DirectSession, NoopPushManager, ServerPushManager, UiSession};
use crate::runnable::Runnable;
use crate::synchronizer::Synchronizer;
use crate::timer_exec::{SchedulerSnapshot, TimerExecScheduler};

/// Receives failures surfaced by [`Display::read_and_dispatch`].
pub type ExceptionHandler = Arc<dyn Fn(&RwtError) + Send + Sync>;

/// Process-wide registry of live displays.
static DISPLAYS: OnceLock<Mutex<Vec<Weak<DisplayInner>>>> = OnceLock::new();

fn displays() -> &'static Mutex<Vec<Weak<DisplayInner>>> {
    DISPLAYS.get_or_init(|| Mutex::new(Vec::new()))
}

fn register(inner: &Arc<DisplayInner>) {
    let mut displays = displays().lock();
    displays.retain(|weak| weak.strong_count() > 0);
    displays.push(Arc::downgrade(inner));
}

fn deregister(inner: &Arc<DisplayInner>) {
    displays()
        .lock()
        .retain(|weak| weak.strong_count() > 0 && !std::ptr::eq(weak.as_ptr(), Arc::as_ptr(inner)));
}

pub(crate) struct DisplayInner {
    device: Arc<Device>,
    config: DisplayConfig,
    created: Instant,
    synchronizer: Mutex<Arc<Synchronizer>>,
    event_table: EventTable,
    filter_table: EventTable,
    dispose_list: Mutex<Vec<Runnable>>,
    scheduler: Mutex<Option<TimerExecScheduler>>,
    exception_handler: Mutex<Option<ExceptionHandler>>,
}

/// Handle to a session's display. Clones share the same display.
#[derive(Clone)]
pub struct Display {
    inner: Arc<DisplayInner>,
}

static_assertions::assert_impl_all!(Display: Send, Sync);

impl Display {
    /// Create a display bound to the calling thread with default configuration.
    pub fn new(session: Arc<dyn UiSession>, push: Arc<dyn ServerPushManager>) -> Self {
        Self::with_config(session, push, DisplayConfig::default())
    }

    /// Create a display bound to the calling thread.
    pub fn with_config(
        session: Arc<dyn UiSession>,
        push: Arc<dyn ServerPushManager>,
        config: DisplayConfig,
    ) -> Self {
        let device = Arc::new(Device::new(session, push));
        let synchronizer = Arc::new(Synchronizer::new(
            device.clone(),
            config.synchronizer.clone(),
        ));
        let inner = Arc::new(DisplayInner {
            device,
            config,
            created: Instant::now(),
            synchronizer: Mutex::new(synchronizer),
            event_table: EventTable::new(),
            filter_table: EventTable::new(),
            dispose_list: Mutex::new(Vec::new()),
            scheduler: Mutex::new(None),
            exception_handler: Mutex::new(None),
        });
        register(&inner);
        tracing::debug!(target: targets::DISPLAY, thread = ?thread::current().id(), "display created");
        Self { inner }
    }

    /// Start building a display.
    pub fn builder() -> DisplayBuilder {
        DisplayBuilder::new()
    }

    pub(crate) fn from_inner(inner: Arc<DisplayInner>) -> Self {
        Self { inner }
    }

    pub(crate) fn inner(&self) -> &Arc<DisplayInner> {
        &self.inner
    }

    /// The device underlying the display.
    pub fn device(&self) -> &Arc<Device> {
        &self.inner.device
    }

    /// The configuration the display was built with.
    pub fn config(&self) -> &DisplayConfig {
        &self.inner.config
    }

    /// The live display whose UI thread is `thread`.
    pub fn find_display(thread: ThreadId) -> Option<Display> {
        displays()
            .lock()
            .iter()
            .filter_map(Weak::upgrade)
            .map(Display::from_inner)
            .find(|display| !display.is_disposed() && display.thread() == Some(thread))
    }

    /// The live display whose UI thread is the calling thread.
    pub fn current() -> Option<Display> {
        Self::find_display(thread::current().id())
    }

    /// Whether both handles refer to the same display.
    pub fn ptr_eq(&self, other: &Display) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.device.is_disposed()
    }

    /// Fail unless called on the UI thread of a live display.
    pub fn check_device(&self) -> Result<()> {
        self.inner.device.check_device()
    }

    // -------------------------------------------------------------------------
    // Threading
    // -------------------------------------------------------------------------

    /// Bind the calling thread as the UI thread.
    pub fn attach_thread(&self) {
        self.inner.device.attach_thread();
    }

    /// Unbind the UI thread.
    pub fn detach_thread(&self) {
        self.inner.device.detach_thread();
    }

    /// The bound UI thread, if any.
    pub fn thread(&self) -> Option<ThreadId> {
        self.inner.device.thread()
    }

    /// The thread waiting on the `sync_exec` message the UI thread is running.
    pub fn sync_thread(&self) -> Result<Option<ThreadId>> {
        let device = self.inner.device.lock();
        if device.disposed {
            return Err(RwtError::DeviceDisposed);
        }
        Ok(self.inner.synchronizer.lock().sync_thread())
    }

    /// The current message queue.
    pub fn synchronizer(&self) -> Arc<Synchronizer> {
        self.inner.synchronizer.lock().clone()
    }

    /// Replace the message queue. Messages still pending on the old queue
    /// are run before this returns.
    ///
    /// If one of them fails, the messages behind it move to the new queue
    /// and the failure is returned. Either way the old queue accepts no
    /// further work, so no `sync_exec` caller is left waiting on it.
    pub fn set_synchronizer(&self, synchronizer: Arc<Synchronizer>) -> Result<()> {
        self.check_device()?;
        let old = {
            let _device = self.inner.device.lock();
            let mut current = self.inner.synchronizer.lock();
            if Arc::ptr_eq(&current, &synchronizer) {
                return Ok(());
            }
            std::mem::replace(&mut *current, synchronizer.clone())
        };
        tracing::debug!(target: targets::DISPLAY, pending = old.message_count(), "replacing synchronizer");
        let drained = panic::catch_unwind(AssertUnwindSafe(|| old.run_async_messages(true)));
        old.retire_into(&synchronizer);
        match drained {
            Ok(result) => result.map(|_| ()),
            Err(payload) => panic::resume_unwind(payload),
        }
    }

    // -------------------------------------------------------------------------
    // Cross-thread execution
    // -------------------------------------------------------------------------

    /// Queue `runnable` for the UI thread. May be called from any thread.
    pub fn async_exec(&self, runnable: Option<Runnable>) -> Result<()> {
        let device = self.inner.device.lock();
        if device.disposed {
            return Err(RwtError::DeviceDisposed);
        }
        let synchronizer = self.inner.synchronizer.lock().clone();
        synchronizer.async_exec(runnable);
        drop(device);
        Ok(())
    }

    /// Run `runnable` on the UI thread and wait for it. May be called from
    /// any thread.
    pub fn sync_exec(&self, runnable: Option<Runnable>) -> Result<()> {
        loop {
            let synchronizer = {
                let device = self.inner.device.lock();
                if device.disposed {
                    return Err(RwtError::DeviceDisposed);
                }
                self.inner.synchronizer.lock().clone()
            };
            match synchronizer.sync_exec(runnable.clone()) {
                // The queue was replaced after it was looked up; use the new one.
                Err(RwtError::DeviceDisposed)
                    if !self.is_disposed()
                        && !Arc::ptr_eq(&synchronizer, &self.synchronizer()) => {}
                result => return result,
            }
        }
    }

    /// Run `runnable` on the UI thread after `milliseconds`. A negative delay
    /// cancels a pending run of `runnable` instead.
    pub fn timer_exec(&self, milliseconds: i32, runnable: Runnable) -> Result<()> {
        self.check_device()?;
        let scheduler = self.scheduler();
        if milliseconds < 0 {
            scheduler.cancel(&runnable);
            Ok(())
        } else {
            let delay = Duration::from_millis(u64::from(milliseconds.unsigned_abs()));
            scheduler.schedule(delay, runnable)
        }
    }

    fn scheduler(&self) -> TimerExecScheduler {
        self.inner
            .scheduler
            .lock()
            .get_or_insert_with(|| TimerExecScheduler::new(self))
            .clone()
    }

    /// Wake the UI thread. From a foreign thread this queues an empty message,
    /// which also asks the client for a request.
    pub fn wake(&self) -> Result<()> {
        let device = self.inner.device.lock();
        if device.disposed {
            return Err(RwtError::DeviceDisposed);
        }
        if device.thread != Some(thread::current().id()) {
            let synchronizer = self.inner.synchronizer.lock().clone();
            self.inner
                .device
                .session()
                .exec(&mut || synchronizer.async_exec(Some(Runnable::noop())));
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // UI loop
    // -------------------------------------------------------------------------

    /// Run one pending message. Returns whether there may be more work.
    ///
    /// A failing async message is passed to the exception handler, if one is
    /// installed, and returned otherwise. A [`ThreadDeath`](crate::ThreadDeath)
    /// panic is shown to the handler and then resumed.
    pub fn read_and_dispatch(&self) -> Result<bool> {
        self.check_device()?;
        let _span = SessionSpan::new("read_and_dispatch");
        let synchronizer = self.synchronizer();
        match panic::catch_unwind(AssertUnwindSafe(|| synchronizer.run_async_messages(false))) {
            Ok(Ok(ran)) => Ok(ran),
            Ok(Err(err)) => {
                self.handle_exception(err)?;
                Ok(false)
            }
            Err(payload) => {
                if let Some(handler) = self.exception_handler() {
                    handler(&RwtError::FailedExec(TaskFailure::from_panic(payload.as_ref())));
                }
                panic::resume_unwind(payload)
            }
        }
    }

    fn handle_exception(&self, err: RwtError) -> Result<()> {
        match self.exception_handler() {
            Some(handler) => {
                tracing::debug!(target: targets::DISPLAY, error = %err, "passing failure to exception handler");
                handler(&err);
                Ok(())
            }
            None => Err(err),
        }
    }

    /// Block until a message arrives, the display is woken, or the configured
    /// sleep timeout passes. Returns whether messages are pending.
    pub fn sleep(&self) -> Result<bool> {
        self.check_device()?;
        let synchronizer = self.synchronizer();
        Ok(synchronizer.wait_for_messages(self.inner.config.sleep_timeout))
    }

    /// Install (or with `None`, remove) the exception handler.
    pub fn set_exception_handler(&self, handler: Option<ExceptionHandler>) {
        *self.inner.exception_handler.lock() = handler;
    }

    fn exception_handler(&self) -> Option<ExceptionHandler> {
        self.inner.exception_handler.lock().clone()
    }

    // -------------------------------------------------------------------------
    // Listeners
    // -------------------------------------------------------------------------

    /// Listen for display-level events of `event_type`.
    pub fn add_listener(&self, event_type: EventType, listener: Arc<dyn Listener>) -> Result<()> {
        self.check_device()?;
        self.inner.event_table.hook(event_type, listener);
        Ok(())
    }

    pub fn remove_listener(&self, event_type: EventType, listener: &Arc<dyn Listener>) -> Result<()> {
        self.check_device()?;
        self.inner.event_table.unhook(event_type, listener);
        Ok(())
    }

    pub fn listeners(&self, event_type: EventType) -> Result<Vec<Arc<dyn Listener>>> {
        self.check_device()?;
        Ok(self.inner.event_table.listeners(event_type))
    }

    pub fn is_listening(&self, event_type: EventType) -> bool {
        self.inner.event_table.hooks(event_type)
    }

    /// Add a filter. Filters see every event of `event_type` sent through the
    /// display before its listeners do.
    pub fn add_filter(&self, event_type: EventType, listener: Arc<dyn Listener>) -> Result<()> {
        self.check_device()?;
        self.inner.filter_table.hook(event_type, listener);
        Ok(())
    }

    pub fn remove_filter(&self, event_type: EventType, listener: &Arc<dyn Listener>) -> Result<()> {
        self.check_device()?;
        self.inner.filter_table.unhook(event_type, listener);
        Ok(())
    }

    pub fn filters(&self, event_type: EventType) -> Result<Vec<Arc<dyn Listener>>> {
        self.check_device()?;
        Ok(self.inner.filter_table.listeners(event_type))
    }

    /// Send `event` as `event_type` through the filters, then the listeners.
    ///
    /// An unset event time is stamped with milliseconds since the display
    /// was created.
    pub fn send_event(&self, event_type: EventType, event: &mut Event) {
        event.event_type = event_type;
        if event.time == 0 {
            event.time = self.event_time();
        }
        self.inner.filter_table.send_event(event);
        self.inner.event_table.send_event(event);
    }

    fn event_time(&self) -> i32 {
        let elapsed = self.inner.created.elapsed().as_millis();
        i32::try_from(elapsed).unwrap_or(i32::MAX).max(1)
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Run `runnable` when the display is disposed.
    pub fn dispose_exec(&self, runnable: Runnable) -> Result<()> {
        self.check_device()?;
        self.inner.dispose_list.lock().push(runnable);
        Ok(())
    }

    /// Ask to close the display. A `CLOSE` listener may veto by clearing
    /// `doit`; otherwise the display is disposed.
    pub fn close(&self) -> Result<()> {
        self.check_device()?;
        let mut event = Event::new(EventType::CLOSE);
        self.send_event(EventType::CLOSE, &mut event);
        if event.doit {
            self.dispose()?;
        } else {
            tracing::debug!(target: targets::DISPLAY, "close vetoed");
        }
        Ok(())
    }

    /// Dispose the display. Disposing twice is a no-op.
    ///
    /// Sends `DISPOSE`, runs the dispose runnables, releases threads blocked
    /// in `sync_exec`, stops the timer scheduler and drops all listeners.
    pub fn dispose(&self) -> Result<()> {
        if self.is_disposed() {
            return Ok(());
        }
        self.check_device()?;

        self.send_event(EventType::DISPOSE, &mut Event::new(EventType::DISPOSE));
        self.run_dispose_execs();
        self.synchronizer().release_synchronizer();
        let scheduler = self.inner.scheduler.lock().take();
        if let Some(scheduler) = scheduler {
            scheduler.dispose();
        }
        self.inner.filter_table.clear();
        self.inner.event_table.clear();

        self.inner.device.mark_disposed();
        deregister(&self.inner);
        tracing::debug!(target: targets::DISPLAY, "display disposed");
        Ok(())
    }

    fn run_dispose_execs(&self) {
        let runnables = std::mem::take(&mut *self.inner.dispose_list.lock());
        for runnable in runnables {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| runnable.run())) {
                let failure = TaskFailure::from_panic(payload.as_ref());
                tracing::warn!(target: targets::DISPLAY, error = %failure, "dispose runnable failed");
            }
        }
    }

    // -------------------------------------------------------------------------
    // Timer persistence
    // -------------------------------------------------------------------------

    /// Capture the pending `timer_exec` tasks.
    pub fn timer_snapshot(&self) -> SchedulerSnapshot {
        self.inner
            .scheduler
            .lock()
            .as_ref()
            .map(TimerExecScheduler::snapshot)
            .unwrap_or_default()
    }

    /// Replace the pending `timer_exec` tasks with those in `snapshot`.
    pub fn restore_timers<R>(&self, snapshot: &SchedulerSnapshot, resolver: R) -> Result<()>
    where
        R: Fn(&str) -> Option<Runnable>,
    {
        self.check_device()?;
        let restored = TimerExecScheduler::restore(self, snapshot, resolver)?;
        let previous = self.inner.scheduler.lock().replace(restored);
        if let Some(previous) = previous {
            previous.dispose();
        }
        Ok(())
    }
}

impl std::fmt::Debug for Display {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Display")
            .field("device", &self.inner.device)
            .finish_non_exhaustive()
    }
}

/// Builder for creating a [`Display`] with custom collaborators and
/// configuration.
#[derive(Default)]
pub struct DisplayBuilder {
    session: Option<Arc<dyn UiSession>>,
    push: Option<Arc<dyn ServerPushManager>>,
    config: DisplayConfig,
}

impl DisplayBuilder {
    /// Create a builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the UI session. Defaults to [`DirectSession`].
    pub fn session(mut self, session: Arc<dyn UiSession>) -> Self {
        self.session = Some(session);
        self
    }

    /// Set the push manager. Defaults to [`NoopPushManager`].
    pub fn push(mut self, push: Arc<dyn ServerPushManager>) -> Self {
        self.push = Some(push);
        self
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: DisplayConfig) -> Self {
        self.config = config;
        self
    }

    pub fn synchronizer(mut self, config: SynchronizerConfig) -> Self {
        self.config.synchronizer = config;
        self
    }

    pub fn null_runnable(mut self, policy: NullRunnablePolicy) -> Self {
        self.config.synchronizer.null_runnable = policy;
        self
    }

    pub fn timer(mut self, config: TimerConfig) -> Self {
        self.config.timer = config;
        self
    }

    pub fn sleep_timeout(mut self, timeout: Duration) -> Self {
        self.config.sleep_timeout = timeout;
        self
    }

    /// Build the display, bound to the calling thread.
    pub fn build(self) -> Display {
        Display::with_config(
            self.session.unwrap_or_else(|| Arc::new(DirectSession)),
            self.push.unwrap_or_else(|| Arc::new(NoopPushManager)),
            self.config,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn recording(log: &Arc<Mutex<Vec<&'static str>>>, name: &'static str) -> Arc<dyn Listener> {
        let log = log.clone();
        Arc::new(move |_: &mut Event| log.lock().push(name))
    }

    #[test]
    fn test_filters_run_before_listeners() {
        let display = Display::builder().build();
        let log = Arc::new(Mutex::new(Vec::new()));
        display.add_listener(EventType::SKIN, recording(&log, "listener")).unwrap();
        display.add_filter(EventType::SKIN, recording(&log, "filter")).unwrap();

        let mut event = Event::default();
        display.send_event(EventType::SKIN, &mut event);
        assert_eq!(*log.lock(), vec!["filter", "listener"]);
        assert_eq!(event.event_type, EventType::SKIN);
        assert!(event.time > 0);
        display.dispose().unwrap();
    }

    #[test]
    fn test_filter_can_swallow_event() {
        let display = Display::builder().build();
        let log = Arc::new(Mutex::new(Vec::new()));
        display
            .add_filter(
                EventType::SKIN,
                Arc::new(|event: &mut Event| event.event_type = EventType::NONE),
            )
            .unwrap();
        display.add_listener(EventType::SKIN, recording(&log, "listener")).unwrap();

        display.send_event(EventType::SKIN, &mut Event::default());
        assert!(log.lock().is_empty());
        display.dispose().unwrap();
    }

    #[test]
    fn test_close_veto_keeps_display() {
        let display = Display::builder().build();
        display
            .add_listener(EventType::CLOSE, Arc::new(|event: &mut Event| event.doit = false))
            .unwrap();
        display.close().unwrap();
        assert!(!display.is_disposed());
        display.dispose().unwrap();
        assert!(display.is_disposed());
    }

    #[test]
    fn test_close_disposes_and_runs_dispose_execs_once() {
        let display = Display::builder().build();
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        display
            .dispose_exec(Runnable::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();
        display.dispose_exec(Runnable::new(|| panic!("dispose failure"))).unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));
        display.add_listener(EventType::DISPOSE, recording(&log, "dispose")).unwrap();

        display.close().unwrap();
        assert!(display.is_disposed());
        display.dispose().unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(*log.lock(), vec!["dispose"]);
    }

    #[test]
    fn test_operations_after_dispose_fail() {
        let display = Display::builder().build();
        display.dispose().unwrap();
        assert!(matches!(display.async_exec(Some(Runnable::noop())), Err(RwtError::DeviceDisposed)));
        assert!(matches!(display.sync_exec(Some(Runnable::noop())), Err(RwtError::DeviceDisposed)));
        assert!(matches!(display.read_and_dispatch(), Err(RwtError::DeviceDisposed)));
        assert!(matches!(display.wake(), Err(RwtError::DeviceDisposed)));
    }

    #[test]
    fn test_foreign_thread_access_is_rejected() {
        let display = Display::builder().build();
        let remote = display.clone();
        let (read, queued) = thread::spawn(move || {
            let read = remote.read_and_dispatch();
            let queued = remote.async_exec(Some(Runnable::noop()));
            (read, queued)
        })
        .join()
        .unwrap();
        assert!(matches!(read, Err(RwtError::InvalidThreadAccess)));
        assert!(queued.is_ok());
        assert!(display.read_and_dispatch().unwrap());
        display.dispose().unwrap();
    }

    #[test]
    fn test_find_display_and_current() {
        let display = Display::builder().build();
        let found = Display::current().unwrap();
        assert!(found.ptr_eq(&display));

        let id = thread::current().id();
        let remote = thread::spawn(move || Display::current().is_none()).join().unwrap();
        assert!(remote);

        display.dispose().unwrap();
        assert!(Display::find_display(id).is_none());
    }

    #[test]
    fn test_exception_handler_receives_async_failure() {
        let display = Display::builder().build();
        display
            .async_exec(Some(Runnable::new(|| panic!("handled failure"))))
            .unwrap();
        assert!(display.read_and_dispatch().is_err());

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        display.set_exception_handler(Some(Arc::new(move |err: &RwtError| {
            sink.lock().push(err.to_string());
        })));
        display
            .async_exec(Some(Runnable::new(|| panic!("handled failure"))))
            .unwrap();
        assert!(!display.read_and_dispatch().unwrap());
        assert_eq!(seen.lock().len(), 1);
        display.dispose().unwrap();
    }

    #[test]
    fn test_wake_from_owner_is_noop() {
        let display = Display::builder().build();
        display.wake().unwrap();
        assert_eq!(display.synchronizer().message_count(), 0);

        let remote = display.clone();
        thread::spawn(move || remote.wake().unwrap()).join().unwrap();
        assert_eq!(display.synchronizer().message_count(), 1);
        assert!(display.sleep().unwrap());
        display.dispose().unwrap();
    }

    #[test]
    fn test_set_synchronizer_drains_old_queue() {
        let display = Display::builder().build();
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        display
            .async_exec(Some(Runnable::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })))
            .unwrap();

        let replacement = Arc::new(Synchronizer::new(
            display.device().clone(),
            SynchronizerConfig::default(),
        ));
        display.set_synchronizer(replacement.clone()).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&display.synchronizer(), &replacement));
        display.dispose().unwrap();
    }

    #[test]
    fn test_timer_exec_negative_delay_cancels() {
        let display = Display::builder().build();
        let runnable = Runnable::noop();
        display.timer_exec(60_000, runnable.clone()).unwrap();
        assert_eq!(display.scheduler().pending_count(), 1);
        display.timer_exec(-1, runnable).unwrap();
        assert_eq!(display.scheduler().pending_count(), 0);
        display.dispose().unwrap();
    }
}
