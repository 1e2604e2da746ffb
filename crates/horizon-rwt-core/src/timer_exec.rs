//! Delayed execution of runnables on the UI thread.
//!
//! The scheduler keeps one pending [`TimerExecTask`] per runnable. When a
//! task's deadline passes on the background [`Timer`] thread, the runnable is
//! handed to the display's `async_exec`, so it still runs on the UI thread.
//! Every pending task holds the client's push channel open under its own
//! [`PushKey`] until it fires or is cancelled.
//!
//! Pending tasks can be captured with [`TimerExecScheduler::snapshot`] and
//! re-armed later at their original absolute fire times with
//! [`TimerExecScheduler::restore`]. Only named runnables survive a snapshot.

use std::sync::{Arc, Weak};
use std::time::{Duration, SystemTime};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use slotmap::{SlotMap, new_key_type};

use crate::config::TimerConfig;
use crate::display::{Display, DisplayInner};
use crate::error::{Result, RwtError};
use crate::logging::targets;
use crate::push::{PushKey, ServerPushManager, UiSession};
use crate::runnable::Runnable;
use crate::timer::Timer;

new_key_type! {
    /// Identifies a pending timer task.
    pub struct TimerTaskId;
}

/// A runnable waiting for its deadline.
#[derive(Debug, Clone)]
pub struct TimerExecTask {
    runnable: Runnable,
    /// Latest deadline. A timer deadline that no longer matches it is stale.
    fire_at: SystemTime,
    push_key: PushKey,
}

impl TimerExecTask {
    /// The runnable handed to `async_exec` when the task fires.
    pub fn runnable(&self) -> &Runnable {
        &self.runnable
    }

    /// Absolute time the task is armed for.
    pub fn fire_at(&self) -> SystemTime {
        self.fire_at
    }

    /// Key the task holds the push channel open under.
    pub fn push_key(&self) -> PushKey {
        self.push_key
    }
}

/// Serializable record of one pending task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTimerTask {
    /// Name of the runnable, resolved again on restore.
    pub runnable: String,
    /// Absolute deadline.
    pub fire_at: SystemTime,
}

/// Serializable state of a scheduler: its pending tasks, earliest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerSnapshot {
    pub tasks: Vec<PendingTimerTask>,
}

struct SchedulerState {
    tasks: SlotMap<TimerTaskId, TimerExecTask>,
    timer: Option<Timer<TimerTaskId>>,
    disposed: bool,
}

struct SchedulerShared {
    display: Weak<DisplayInner>,
    session: Arc<dyn UiSession>,
    push: Arc<dyn ServerPushManager>,
    config: TimerConfig,
    state: Mutex<SchedulerState>,
}

impl SchedulerShared {
    fn activate(&self, key: PushKey) {
        let push = &self.push;
        self.session.exec(&mut || push.activate_server_push_for(key));
    }

    fn deactivate(&self, key: PushKey) {
        let push = &self.push;
        self.session.exec(&mut || push.deactivate_server_push_for(key));
    }
}

/// Schedules runnables to run on the UI thread after a delay.
///
/// Cloning yields another handle to the same scheduler.
#[derive(Clone)]
pub struct TimerExecScheduler {
    shared: Arc<SchedulerShared>,
}

static_assertions::assert_impl_all!(TimerExecScheduler: Send, Sync);

impl TimerExecScheduler {
    /// Create a scheduler delivering to `display`. The timer thread is only
    /// started by the first `schedule` call.
    pub fn new(display: &Display) -> Self {
        let device = display.device();
        Self {
            shared: Arc::new(SchedulerShared {
                display: Arc::downgrade(display.inner()),
                session: device.session().clone(),
                push: device.push().clone(),
                config: display.config().timer.clone(),
                state: Mutex::new(SchedulerState {
                    tasks: SlotMap::with_key(),
                    timer: None,
                    disposed: false,
                }),
            }),
        }
    }

    /// Run `runnable` on the UI thread once `delay` has elapsed.
    ///
    /// Scheduling a runnable that is already pending moves its deadline
    /// instead of adding a second task.
    pub fn schedule(&self, delay: Duration, runnable: Runnable) -> Result<()> {
        self.arm(SystemTime::now() + delay, runnable)
    }

    fn arm(&self, fire_at: SystemTime, runnable: Runnable) -> Result<()> {
        let shared = &self.shared;
        let mut state = shared.state.lock();
        if state.disposed {
            return Err(RwtError::DeviceDisposed);
        }
        if state.timer.is_none() {
            let weak = Arc::downgrade(shared);
            let timer = Timer::spawn(&shared.config, move |id: TimerTaskId, fire_at: SystemTime| {
                if let Some(shared) = weak.upgrade() {
                    fire(&shared, id, fire_at);
                }
            })?;
            state.timer = Some(timer);
        }

        let existing = state
            .tasks
            .iter()
            .find(|(_, task)| task.runnable.ptr_eq(&runnable))
            .map(|(id, _)| id);
        let (id, activated) = match existing {
            Some(id) => {
                state.tasks[id].fire_at = fire_at;
                tracing::trace!(target: targets::TIMER_EXEC, ?id, "re-armed timer task");
                (id, None)
            }
            None => {
                let push_key = PushKey::next();
                let id = state.tasks.insert(TimerExecTask {
                    runnable,
                    fire_at,
                    push_key,
                });
                tracing::trace!(target: targets::TIMER_EXEC, ?id, "created timer task");
                (id, Some(push_key))
            }
        };

        if let Some(timer) = &state.timer {
            timer.schedule(fire_at, id);
        }
        drop(state);
        if let Some(push_key) = activated {
            shared.activate(push_key);
        }
        Ok(())
    }

    /// Drop the pending task for `runnable`, if there is one.
    pub fn cancel(&self, runnable: &Runnable) {
        let removed = {
            let mut state = self.shared.state.lock();
            let id = state
                .tasks
                .iter()
                .find(|(_, task)| task.runnable.ptr_eq(runnable))
                .map(|(id, _)| id);
            let removed = id.and_then(|id| state.tasks.remove(id));
            if let (Some(id), Some(timer)) = (id, &state.timer) {
                timer.unschedule(id);
            }
            removed
        };
        if let Some(task) = removed {
            tracing::trace!(target: targets::TIMER_EXEC, "cancelled timer task");
            self.shared.deactivate(task.push_key);
        }
    }

    /// Stop the timer thread and drop every pending task.
    pub fn dispose(&self) {
        let (timer, tasks) = {
            let mut state = self.shared.state.lock();
            state.disposed = true;
            let tasks: Vec<_> = state.tasks.drain().map(|(_, task)| task).collect();
            (state.timer.take(), tasks)
        };
        if let Some(timer) = timer {
            timer.cancel();
        }
        tracing::debug!(target: targets::TIMER_EXEC, dropped = tasks.len(), "disposed timer scheduler");
        for task in tasks {
            self.shared.deactivate(task.push_key);
        }
    }

    /// Number of pending tasks.
    pub fn pending_count(&self) -> usize {
        self.shared.state.lock().tasks.len()
    }

    /// Deadline of the pending task for `runnable`.
    pub fn fire_time(&self, runnable: &Runnable) -> Option<SystemTime> {
        self.shared
            .state
            .lock()
            .tasks
            .values()
            .find(|task| task.runnable.ptr_eq(runnable))
            .map(|task| task.fire_at)
    }

    /// Snapshot of the pending tasks.
    pub fn tasks(&self) -> Vec<TimerExecTask> {
        self.shared.state.lock().tasks.values().cloned().collect()
    }

    /// Capture the pending tasks for later [`restore`](Self::restore).
    ///
    /// Tasks whose runnable has no name cannot be resolved again and are
    /// left out.
    pub fn snapshot(&self) -> SchedulerSnapshot {
        let state = self.shared.state.lock();
        let mut tasks: Vec<_> = state
            .tasks
            .values()
            .filter_map(|task| match task.runnable.name() {
                Some(name) => Some(PendingTimerTask {
                    runnable: name.to_string(),
                    fire_at: task.fire_at,
                }),
                None => {
                    tracing::warn!(
                        target: targets::TIMER_EXEC,
                        fire_at = ?task.fire_at,
                        "unnamed runnable left out of timer snapshot"
                    );
                    None
                }
            })
            .collect();
        tasks.sort_by_key(|task| task.fire_at);
        SchedulerSnapshot { tasks }
    }

    /// Rebuild a scheduler for `display` from `snapshot`.
    ///
    /// Every task is re-armed at its recorded absolute deadline; deadlines
    /// already in the past fire right away. `resolver` maps a recorded name
    /// back to its runnable. Nothing is armed if any name fails to resolve.
    pub fn restore<R>(display: &Display, snapshot: &SchedulerSnapshot, resolver: R) -> Result<Self>
    where
        R: Fn(&str) -> Option<Runnable>,
    {
        let resolved = snapshot
            .tasks
            .iter()
            .map(|task| {
                resolver(&task.runnable)
                    .map(|runnable| (task.fire_at, runnable))
                    .ok_or_else(|| {
                        RwtError::invalid_argument(format!(
                            "unknown timer runnable '{}'",
                            task.runnable
                        ))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        let scheduler = Self::new(display);
        for (fire_at, runnable) in resolved {
            scheduler.arm(fire_at, runnable)?;
        }
        tracing::debug!(
            target: targets::TIMER_EXEC,
            restored = scheduler.pending_count(),
            "restored timer scheduler"
        );
        Ok(scheduler)
    }
}

impl std::fmt::Debug for TimerExecScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerExecScheduler")
            .field("pending", &self.pending_count())
            .finish_non_exhaustive()
    }
}

/// Deadline callback, run on the timer thread.
fn fire(shared: &SchedulerShared, id: TimerTaskId, fire_at: SystemTime) {
    let task = {
        let mut state = shared.state.lock();
        if state.disposed {
            return;
        }
        match state.tasks.get(id) {
            Some(task) if task.fire_at == fire_at => state.tasks.remove(id),
            _ => None,
        }
    };
    let Some(task) = task else {
        tracing::trace!(target: targets::TIMER_EXEC, ?id, "skipping stale deadline");
        return;
    };

    match shared.display.upgrade().map(Display::from_inner) {
        Some(display) if !display.is_disposed() => {
            if let Err(err) = display.async_exec(Some(task.runnable.clone())) {
                tracing::debug!(target: targets::TIMER_EXEC, error = %err, "timer task dropped");
            }
        }
        _ => tracing::debug!(target: targets::TIMER_EXEC, "display gone, timer task dropped"),
    }
    shared.deactivate(task.push_key);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::push::DirectSession;
    use crate::push::NoopPushManager;

    fn display() -> Display {
        Display::new(Arc::new(DirectSession), Arc::new(NoopPushManager))
    }

    #[test]
    fn test_reschedule_keeps_one_task() {
        let display = display();
        let scheduler = TimerExecScheduler::new(&display);
        let runnable = Runnable::noop();
        scheduler.schedule(Duration::from_secs(60), runnable.clone()).unwrap();
        let first = scheduler.fire_time(&runnable).unwrap();
        scheduler.schedule(Duration::from_secs(120), runnable.clone()).unwrap();
        let second = scheduler.fire_time(&runnable).unwrap();

        assert_eq!(scheduler.pending_count(), 1);
        assert!(second > first);
        scheduler.dispose();
    }

    fn timer_deadlines(scheduler: &TimerExecScheduler) -> usize {
        let state = scheduler.shared.state.lock();
        state.timer.as_ref().map_or(0, |timer| timer.pending_deadlines())
    }

    #[test]
    fn test_rearm_replaces_timer_deadline() {
        let display = display();
        let scheduler = TimerExecScheduler::new(&display);
        let runnable = Runnable::noop();
        for minutes in 1..=50 {
            scheduler
                .schedule(Duration::from_secs(60 * minutes), runnable.clone())
                .unwrap();
        }
        assert_eq!(scheduler.pending_count(), 1);
        assert_eq!(timer_deadlines(&scheduler), 1);

        scheduler.cancel(&runnable);
        assert_eq!(scheduler.pending_count(), 0);
        assert_eq!(timer_deadlines(&scheduler), 0);
        scheduler.dispose();
    }

    /// Push manager that reads the scheduler back while it is notified.
    #[derive(Default)]
    struct ReentrantPush {
        scheduler: std::sync::OnceLock<TimerExecScheduler>,
        seen: Mutex<Vec<usize>>,
    }

    impl ServerPushManager for ReentrantPush {
        fn set_has_runnables(&self, _has_runnables: bool) {}

        fn activate_server_push_for(&self, _key: PushKey) {
            if let Some(scheduler) = self.scheduler.get() {
                self.seen.lock().push(scheduler.pending_count());
            }
        }

        fn deactivate_server_push_for(&self, _key: PushKey) {
            if let Some(scheduler) = self.scheduler.get() {
                self.seen.lock().push(scheduler.pending_count());
            }
        }

        fn wake_client(&self) {}
    }

    #[test]
    fn test_push_manager_may_reenter_scheduler() {
        let push = Arc::new(ReentrantPush::default());
        let display = Display::new(Arc::new(DirectSession), push.clone());
        let scheduler = TimerExecScheduler::new(&display);
        assert!(push.scheduler.set(scheduler.clone()).is_ok());

        let runnable = Runnable::noop();
        scheduler.schedule(Duration::from_secs(60), runnable.clone()).unwrap();
        scheduler.cancel(&runnable);

        assert_eq!(*push.seen.lock(), vec![1, 0]);
        scheduler.dispose();
    }

    #[test]
    fn test_cancel_unknown_is_noop() {
        let display = display();
        let scheduler = TimerExecScheduler::new(&display);
        scheduler.cancel(&Runnable::noop());
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[test]
    fn test_schedule_after_dispose_fails() {
        let display = display();
        let scheduler = TimerExecScheduler::new(&display);
        scheduler.schedule(Duration::from_secs(60), Runnable::noop()).unwrap();
        scheduler.dispose();
        assert_eq!(scheduler.pending_count(), 0);
        assert!(matches!(
            scheduler.schedule(Duration::ZERO, Runnable::noop()),
            Err(RwtError::DeviceDisposed)
        ));
    }

    #[test]
    fn test_snapshot_skips_unnamed_and_orders_by_deadline() {
        let display = display();
        let scheduler = TimerExecScheduler::new(&display);
        scheduler.schedule(Duration::from_secs(90), Runnable::named("late", || {})).unwrap();
        scheduler.schedule(Duration::from_secs(30), Runnable::named("early", || {})).unwrap();
        scheduler.schedule(Duration::from_secs(60), Runnable::noop()).unwrap();

        let snapshot = scheduler.snapshot();
        let names: Vec<_> = snapshot.tasks.iter().map(|t| t.runnable.as_str()).collect();
        assert_eq!(names, vec!["early", "late"]);
        scheduler.dispose();
    }

    #[test]
    fn test_restore_rejects_unknown_name() {
        let display = display();
        let snapshot = SchedulerSnapshot {
            tasks: vec![PendingTimerTask {
                runnable: "missing".to_string(),
                fire_at: SystemTime::now(),
            }],
        };
        let result = TimerExecScheduler::restore(&display, &snapshot, |_| None);
        assert!(matches!(result, Err(RwtError::InvalidArgument(_))));
    }
}
