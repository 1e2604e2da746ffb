//! Error types for Horizon RWT.

use std::any::Any;

/// The main error type for session core operations.
#[derive(Debug, thiserror::Error)]
pub enum RwtError {
    /// The display (or device) has been disposed.
    #[error("Device is disposed")]
    DeviceDisposed,

    /// The operation was invoked from a thread that is not the session's UI thread.
    #[error("Invalid thread access")]
    InvalidThreadAccess,

    /// An argument was rejected.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A runnable failed while executing on the UI thread.
    #[error("Failed to execute runnable ({0})")]
    FailedExec(#[source] TaskFailure),

    /// The background timer thread could not be started.
    #[error("Failed to start timer thread: {0}")]
    ThreadSpawn(#[source] std::io::Error),
}

impl RwtError {
    /// Create an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Returns the task failure if this is a [`RwtError::FailedExec`].
    pub fn task_failure(&self) -> Option<&TaskFailure> {
        match self {
            Self::FailedExec(failure) => Some(failure),
            _ => None,
        }
    }
}

/// A failure captured from a panicking runnable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct TaskFailure {
    message: String,
    fatal: bool,
}

impl TaskFailure {
    /// Create a failure with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            fatal: false,
        }
    }

    /// Build a failure from a caught panic payload.
    pub(crate) fn from_panic(payload: &(dyn Any + Send)) -> Self {
        if payload.is::<ThreadDeath>() {
            return Self {
                message: "thread death".to_string(),
                fatal: true,
            };
        }
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "runnable panicked".to_string()
        };
        Self {
            message,
            fatal: false,
        }
    }

    /// The panic message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether the failure was a [`ThreadDeath`] termination request.
    pub fn is_fatal(&self) -> bool {
        self.fatal
    }
}

/// Panic payload requesting termination of the thread running the UI loop.
///
/// Raised with `std::panic::panic_any(ThreadDeath)`. The synchronizer records
/// it on the pending lock like any other failure but always resumes the
/// unwind instead of swallowing it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ThreadDeath;

/// A specialized Result type for session core operations.
pub type Result<T> = std::result::Result<T, RwtError>;
