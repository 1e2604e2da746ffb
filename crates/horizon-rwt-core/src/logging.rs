//! Logging facilities for Horizon RWT.
//!
//! The session core is instrumented with the `tracing` crate. Nothing is
//! printed unless the embedding server installs a subscriber:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("horizon_rwt_core::synchronizer=debug")
//!     .init();
//! ```

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core framework target.
    pub const CORE: &str = "horizon_rwt_core";
    /// Event table dispatch target.
    pub const EVENT_TABLE: &str = "horizon_rwt_core::event_table";
    /// Typed listener dispatch target.
    pub const TYPED: &str = "horizon_rwt_core::typed";
    /// Synchronizer (message queue) target.
    pub const SYNCHRONIZER: &str = "horizon_rwt_core::synchronizer";
    /// Background timer thread target.
    pub const TIMER: &str = "horizon_rwt_core::timer";
    /// Timer exec scheduler target.
    pub const TIMER_EXEC: &str = "horizon_rwt_core::timer_exec";
    /// Display lifecycle target.
    pub const DISPLAY: &str = "horizon_rwt_core::display";
}

/// A guard that keeps a tracing span entered for the duration of a UI
/// operation, used to attribute nested log lines to a session.
///
/// # Example
///
/// ```
/// use horizon_rwt_core::logging::SessionSpan;
///
/// let _span = SessionSpan::new("read_and_dispatch");
/// // ... work ...
/// ```
pub struct SessionSpan {
    _span: tracing::span::EnteredSpan,
}

impl SessionSpan {
    /// Enter a new span for `operation`.
    pub fn new(operation: &'static str) -> Self {
        let span = tracing::debug_span!(target: targets::CORE, "session", operation);
        Self {
            _span: span.entered(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_targets_share_crate_prefix() {
        for target in [
            targets::EVENT_TABLE,
            targets::TYPED,
            targets::SYNCHRONIZER,
            targets::TIMER,
            targets::TIMER_EXEC,
            targets::DISPLAY,
        ] {
            assert!(target.starts_with(targets::CORE));
        }
    }

    #[test]
    fn test_session_span_without_subscriber() {
        let _span = SessionSpan::new("test_operation");
    }
}
