//! Configuration for the display and its subsystems.

use std::time::Duration;

/// Default number of slots the message queue grows by.
pub const DEFAULT_GROW_SIZE: usize = 4;

/// Default queue capacity above which an emptied queue gives memory back.
pub const DEFAULT_MESSAGE_LIMIT: usize = 64;

/// What `async_exec` does with a missing runnable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NullRunnablePolicy {
    /// Wake the client and return without queueing anything.
    #[default]
    Wake,
    /// Queue a no-op message, which also wakes the client.
    Enqueue,
}

/// Configuration for a [`Synchronizer`](crate::Synchronizer).
#[derive(Debug, Clone)]
pub struct SynchronizerConfig {
    /// Initial queue capacity, and the size it shrinks back to.
    pub grow_size: usize,
    /// Capacity above which an emptied queue is shrunk.
    pub message_limit: usize,
    pub null_runnable: NullRunnablePolicy,
}

impl Default for SynchronizerConfig {
    fn default() -> Self {
        Self {
            grow_size: DEFAULT_GROW_SIZE,
            message_limit: DEFAULT_MESSAGE_LIMIT,
            null_runnable: NullRunnablePolicy::default(),
        }
    }
}

/// Configuration for the timer-exec background thread.
#[derive(Debug, Clone)]
pub struct TimerConfig {
    /// Name of the timer thread.
    pub thread_name: String,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            thread_name: "horizon-rwt-timer".to_string(),
        }
    }
}

impl TimerConfig {
    /// Create a configuration with the given thread name.
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            thread_name: name.into(),
        }
    }
}

/// Configuration for a [`Display`](crate::Display).
#[derive(Debug, Clone)]
pub struct DisplayConfig {
    pub synchronizer: SynchronizerConfig,
    pub timer: TimerConfig,
    /// Upper bound on how long [`Display::sleep`](crate::Display::sleep)
    /// blocks when no message arrives.
    pub sleep_timeout: Duration,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            synchronizer: SynchronizerConfig::default(),
            timer: TimerConfig::default(),
            sleep_timeout: Duration::from_millis(500),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DisplayConfig::default();
        assert_eq!(config.synchronizer.grow_size, 4);
        assert_eq!(config.synchronizer.message_limit, 64);
        assert_eq!(config.synchronizer.null_runnable, NullRunnablePolicy::Wake);
        assert_eq!(config.timer.thread_name, "horizon-rwt-timer");
    }

    #[test]
    fn test_timer_config_with_name() {
        assert_eq!(TimerConfig::with_name("t").thread_name, "t");
    }
}
