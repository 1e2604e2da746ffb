//! Background timer thread.
//!
//! A [`Timer`] owns one named thread that sleeps until the earliest scheduled
//! deadline and then hands the due key to its callback. Commands reach the
//! thread over a `crossbeam-channel`, so scheduling never blocks on the
//! thread's work. Deadlines are wall-clock [`SystemTime`]s so that a restored
//! schedule keeps its absolute fire times.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::panic::{self, AssertUnwindSafe};
use std::thread;
use std::time::{Duration, SystemTime};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded, unbounded};

use crate::config::TimerConfig;
use crate::error::{Result, RwtError};
use crate::logging::targets;

enum Command<K> {
    Schedule { fire_at: SystemTime, key: K },
    Unschedule(K),
    Count(Sender<usize>),
    Shutdown,
}

/// An entry in the deadline queue (min-heap by fire time, then submission order).
struct Deadline<K> {
    fire_at: SystemTime,
    seq: u64,
    key: K,
}

impl<K> PartialEq for Deadline<K> {
    fn eq(&self, other: &Self) -> bool {
        self.fire_at == other.fire_at && self.seq == other.seq
    }
}

impl<K> Eq for Deadline<K> {}

impl<K> PartialOrd for Deadline<K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K> Ord for Deadline<K> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so the max-heap yields the earliest deadline.
        other
            .fire_at
            .cmp(&self.fire_at)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Handle to a running timer thread.
///
/// The thread holds at most one deadline per key. Dropping the handle (or
/// calling [`cancel`](Self::cancel)) stops the thread without waiting for
/// it; deadlines not yet reached never fire.
pub struct Timer<K: PartialEq + Send + 'static> {
    sender: Sender<Command<K>>,
}

impl<K: PartialEq + Send + 'static> Timer<K> {
    /// Start the timer thread. `on_fire` runs on that thread with the key and
    /// deadline of every entry that comes due.
    pub fn spawn<F>(config: &TimerConfig, on_fire: F) -> Result<Self>
    where
        F: Fn(K, SystemTime) + Send + 'static,
    {
        let (sender, receiver) = unbounded();
        thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || timer_loop(receiver, on_fire))
            .map_err(RwtError::ThreadSpawn)?;
        tracing::debug!(target: targets::TIMER, name = %config.thread_name, "timer thread started");
        Ok(Self { sender })
    }

    /// Arrange for `key` to be handed to the callback at `fire_at`,
    /// replacing any deadline already pending for `key`.
    ///
    /// Returns `false` if the thread has already stopped.
    pub fn schedule(&self, fire_at: SystemTime, key: K) -> bool {
        self.sender.send(Command::Schedule { fire_at, key }).is_ok()
    }

    /// Drop the deadline pending for `key`, if any.
    pub fn unschedule(&self, key: K) -> bool {
        self.sender.send(Command::Unschedule(key)).is_ok()
    }

    /// Number of deadlines the thread is holding, or zero once it stopped.
    pub fn pending_deadlines(&self) -> usize {
        let (reply, count) = bounded(1);
        if self.sender.send(Command::Count(reply)).is_err() {
            return 0;
        }
        count.recv().unwrap_or(0)
    }

    /// Stop the thread. Pending deadlines are discarded.
    pub fn cancel(&self) {
        let _ = self.sender.send(Command::Shutdown);
    }
}

impl<K: PartialEq + Send + 'static> Drop for Timer<K> {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn timer_loop<K, F>(receiver: Receiver<Command<K>>, on_fire: F)
where
    K: PartialEq,
    F: Fn(K, SystemTime),
{
    let mut deadlines: BinaryHeap<Deadline<K>> = BinaryHeap::new();
    let mut seq = 0u64;

    loop {
        let command = match deadlines.peek() {
            Some(Deadline { fire_at, .. }) => {
                let timeout = fire_at
                    .duration_since(SystemTime::now())
                    .unwrap_or(Duration::ZERO);
                receiver.recv_timeout(timeout)
            }
            None => receiver.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        match command {
            Ok(Command::Schedule { fire_at, key }) => {
                deadlines.retain(|deadline| deadline.key != key);
                deadlines.push(Deadline { fire_at, seq, key });
                seq += 1;
            }
            Ok(Command::Unschedule(key)) => deadlines.retain(|deadline| deadline.key != key),
            Ok(Command::Count(reply)) => {
                let _ = reply.send(deadlines.len());
            }
            Ok(Command::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {}
        }

        let now = SystemTime::now();
        while deadlines.peek().is_some_and(|deadline| deadline.fire_at <= now) {
            let Some(deadline) = deadlines.pop() else {
                break;
            };
            tracing::trace!(target: targets::TIMER, seq = deadline.seq, "deadline reached");
            let fire_at = deadline.fire_at;
            if panic::catch_unwind(AssertUnwindSafe(|| on_fire(deadline.key, fire_at))).is_err() {
                tracing::warn!(target: targets::TIMER, "timer callback panicked");
            }
        }
    }

    tracing::debug!(target: targets::TIMER, pending = deadlines.len(), "timer thread stopped");
}
