//! Session core for Horizon RWT.
//!
//! This crate provides the server-side event and threading machinery behind
//! one remote widget toolkit session:
//!
//! - **Event tables**: Ordered, reentrancy-safe listener registries per widget
//! - **Typed listeners**: Strongly-typed listener interfaces over generic events
//! - **Synchronizer**: The UI-thread message queue behind `async_exec`/`sync_exec`
//! - **Timer exec**: Delayed execution on the UI thread, with snapshot/restore
//! - **Display**: The per-session object tying the above to a UI thread
//!
//! Server push notifications and session affinity are delegated to the
//! [`ServerPushManager`] and [`UiSession`] collaborators injected into each
//! display.
//!
//! # Event Table Example
//!
//! ```
//! use std::sync::Arc;
//! use horizon_rwt_core::{Event, EventTable, EventType, Listener};
//!
//! let table = EventTable::new();
//! let veto: Arc<dyn Listener> = Arc::new(|event: &mut Event| event.doit = false);
//! table.hook(EventType::VERIFY, veto.clone());
//!
//! let mut event = Event::new(EventType::VERIFY);
//! table.send_event(&mut event);
//! assert!(!event.doit);
//!
//! table.unhook(EventType::VERIFY, &veto);
//! assert!(!table.hooks(EventType::VERIFY));
//! ```
//!
//! # UI Thread Example
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use horizon_rwt_core::{Display, Runnable};
//!
//! let display = Display::builder().build();
//! let counter = Arc::new(AtomicUsize::new(0));
//!
//! let workers: Vec<_> = (0..4)
//!     .map(|_| {
//!         let display = display.clone();
//!         let counter = counter.clone();
//!         std::thread::spawn(move || {
//!             let runnable = Runnable::new(move || {
//!                 counter.fetch_add(1, Ordering::SeqCst);
//!             });
//!             display.async_exec(Some(runnable)).unwrap();
//!         })
//!     })
//!     .collect();
//! for worker in workers {
//!     worker.join().unwrap();
//! }
//!
//! while display.read_and_dispatch().unwrap() {}
//! assert_eq!(counter.load(Ordering::SeqCst), 4);
//! ```

pub mod config;
mod device;
mod display;
mod error;
mod event;
mod event_table;
mod listener;
pub mod logging;
pub mod push;
mod runnable;
mod synchronizer;
mod timer;
pub mod timer_exec;
pub mod typed;

pub use config::{DisplayConfig, NullRunnablePolicy, SynchronizerConfig, TimerConfig};
pub use device::Device;
pub use display::{Display, DisplayBuilder, ExceptionHandler};
pub use error::{Result, RwtError, TaskFailure, ThreadDeath};
pub use event::{Event, EventData, EventType, WidgetId};
pub use event_table::EventTable;
pub use listener::Listener;
pub use push::{DirectSession, NoopPushManager, PushKey, ServerPushManager, UiSession};
pub use runnable::{Runnable, RunnableLock};
pub use synchronizer::Synchronizer;
pub use timer::Timer;
pub use timer_exec::{
    PendingTimerTask, SchedulerSnapshot, TimerExecScheduler, TimerExecTask, TimerTaskId,
};
pub use typed::{TypedCallback, TypedListener};
