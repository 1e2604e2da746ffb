//! The generic listener interface.

use std::sync::Arc;

use crate::event::Event;
use crate::typed::TypedListener;

/// Receives events dispatched through an [`EventTable`](crate::EventTable).
///
/// Implemented for every `Fn(&mut Event) + Send + Sync` closure:
///
/// ```
/// use std::sync::Arc;
/// use horizon_rwt_core::{Event, EventTable, EventType, Listener};
///
/// let table = EventTable::new();
/// let listener: Arc<dyn Listener> = Arc::new(|event: &mut Event| event.doit = false);
/// table.hook(EventType::CLOSE, listener);
///
/// let mut event = Event::new(EventType::CLOSE);
/// table.send_event(&mut event);
/// assert!(!event.doit);
/// ```
pub trait Listener: Send + Sync {
    /// Handle one event.
    fn handle_event(&self, event: &mut Event);

    /// Returns the typed wrapper if this listener adapts a typed listener.
    fn as_typed(&self) -> Option<&TypedListener> {
        None
    }
}

impl<F> Listener for F
where
    F: Fn(&mut Event) + Send + Sync,
{
    fn handle_event(&self, event: &mut Event) {
        self(event)
    }
}

/// Compare two listener references by allocation identity.
pub(crate) fn same_listener(a: &Arc<dyn Listener>, b: &Arc<dyn Listener>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
