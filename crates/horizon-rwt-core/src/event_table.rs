//! Per-widget table of listeners keyed by event type.
//!
//! The table is an ordered multi-map: the same listener may be hooked several
//! times, and dispatch order is insertion order. Listeners are free to hook,
//! unhook, or dispatch on the same table while an event is being delivered.
//!
//! # Reentrancy
//!
//! A signed nesting level tracks how many [`EventTable::send_event`] calls are
//! on the stack. Removing an entry while the level is non-zero only clears
//! its slot (a tombstone) and flips the level negative; the outermost
//! dispatch compacts the storage when it unwinds. Slot indices therefore stay
//! stable for the whole of a dispatch pass.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::event::{Event, EventType};
use crate::listener::{Listener, same_listener};
use crate::logging::targets;
use crate::typed::{TypedCallback, TypedListener};

/// Number of slots the storage grows by when it is full.
const GROW_SIZE: usize = 4;

struct Slot {
    event_type: EventType,
    listener: Arc<dyn Listener>,
}

struct TableState {
    /// Fixed-capacity slot storage; `None` marks a free slot or a tombstone.
    slots: Vec<Option<Slot>>,
    /// Dispatch nesting level. Negative once a removal happened mid-dispatch.
    level: i32,
}

impl TableState {
    fn remove(&mut self, index: usize) {
        if self.level == 0 {
            self.slots.remove(index);
            self.slots.push(None);
        } else {
            if self.level > 0 {
                self.level = -self.level;
            }
            self.slots[index] = None;
        }
    }

    fn compact(&mut self) {
        let capacity = self.slots.len();
        self.slots.retain(Option::is_some);
        self.slots.resize_with(capacity, || None);
    }
}

/// An ordered table of `(event type, listener)` entries.
pub struct EventTable {
    state: Mutex<TableState>,
}

static_assertions::assert_impl_all!(EventTable: Send, Sync);

impl Default for EventTable {
    fn default() -> Self {
        Self::new()
    }
}

impl EventTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(TableState {
                slots: Vec::new(),
                level: 0,
            }),
        }
    }

    /// Register `listener` for events of `event_type`.
    ///
    /// The entry takes the first free slot after the last live one, growing
    /// the storage by a fixed chunk when none is left. Tombstones left by a
    /// removal mid-dispatch are never reused, so order stays insertion order.
    pub fn hook(&self, event_type: EventType, listener: Arc<dyn Listener>) {
        let mut state = self.state.lock();
        let index = state
            .slots
            .iter()
            .rposition(Option::is_some)
            .map_or(0, |last| last + 1);
        if index == state.slots.len() {
            state.slots.resize_with(index + GROW_SIZE, || None);
        }
        state.slots[index] = Some(Slot {
            event_type,
            listener,
        });
    }

    /// Wrap `callback` in a [`TypedListener`] and hook it for every event
    /// code its capability serves.
    pub fn hook_typed(&self, callback: TypedCallback) -> Arc<TypedListener> {
        let typed = Arc::new(TypedListener::new(callback));
        for &event_type in typed.callback().event_types() {
            self.hook(event_type, typed.clone());
        }
        typed
    }

    /// Remove one typed entry per event code `callback`'s capability serves.
    ///
    /// Returns `true` if any entry was removed.
    pub fn unhook_typed_all(&self, callback: &TypedCallback) -> bool {
        let mut removed = false;
        for &event_type in callback.event_types() {
            removed |= self.unhook_typed(event_type, callback);
        }
        removed
    }

    /// Remove the first entry matching `event_type` and `listener`.
    ///
    /// Returns `true` if an entry was removed.
    pub fn unhook(&self, event_type: EventType, listener: &Arc<dyn Listener>) -> bool {
        self.unhook_where(event_type, |candidate| same_listener(candidate, listener))
    }

    /// Remove the first typed entry for `event_type` wrapping `callback`'s
    /// target listener.
    ///
    /// Returns `true` if an entry was removed.
    pub fn unhook_typed(&self, event_type: EventType, callback: &TypedCallback) -> bool {
        self.unhook_where(event_type, |candidate| {
            candidate
                .as_typed()
                .is_some_and(|typed| typed.callback().same_target(callback))
        })
    }

    fn unhook_where(
        &self,
        event_type: EventType,
        matches: impl Fn(&Arc<dyn Listener>) -> bool,
    ) -> bool {
        let mut state = self.state.lock();
        let found = state.slots.iter().position(|slot| {
            slot.as_ref()
                .is_some_and(|slot| slot.event_type == event_type && matches(&slot.listener))
        });
        match found {
            Some(index) => {
                state.remove(index);
                true
            }
            None => false,
        }
    }

    /// Whether any listener is hooked for `event_type`.
    pub fn hooks(&self, event_type: EventType) -> bool {
        self.state
            .lock()
            .slots
            .iter()
            .flatten()
            .any(|slot| slot.event_type == event_type)
    }

    /// Snapshot of the listeners hooked for `event_type`, in insertion order.
    pub fn listeners(&self, event_type: EventType) -> Vec<Arc<dyn Listener>> {
        self.state
            .lock()
            .slots
            .iter()
            .flatten()
            .filter(|slot| slot.event_type == event_type)
            .map(|slot| slot.listener.clone())
            .collect()
    }

    /// Remove every entry. Safe to call from within a dispatch.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        if state.level == 0 {
            state.slots.clear();
        } else {
            if state.level > 0 {
                state.level = -state.level;
            }
            state.slots.iter_mut().for_each(|slot| *slot = None);
        }
    }

    /// Number of live entries across all event types.
    pub fn size(&self) -> usize {
        self.state.lock().slots.iter().flatten().count()
    }

    /// Deliver `event` to every listener hooked for its type.
    ///
    /// Listeners run synchronously on the calling thread in insertion order.
    /// Delivery stops as soon as a listener resets the event type to
    /// [`EventType::NONE`]. A panicking listener is not caught; the table is
    /// still compacted while the panic unwinds.
    pub fn send_event(&self, event: &mut Event) {
        {
            let mut state = self.state.lock();
            if state.slots.is_empty() {
                return;
            }
            state.level += if state.level >= 0 { 1 } else { -1 };
        }
        let _dispatch = DispatchGuard { table: self };

        tracing::trace!(target: targets::EVENT_TABLE, event_type = event.event_type.code(), "sending event");

        let mut index = 0;
        loop {
            if event.event_type.is_none() {
                return;
            }
            let listener = {
                let state = self.state.lock();
                let Some(slot) = state.slots.get(index) else {
                    break;
                };
                slot.as_ref()
                    .filter(|slot| slot.event_type == event.event_type)
                    .map(|slot| slot.listener.clone())
            };
            if let Some(listener) = listener {
                listener.handle_event(event);
            }
            index += 1;
        }
    }
}

/// Leaves a dispatch level, compacting when the outermost dispatch unwinds
/// after a removal.
struct DispatchGuard<'a> {
    table: &'a EventTable,
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.table.state.lock();
        let compact = state.level < 0;
        state.level -= if state.level >= 0 { 1 } else { -1 };
        if compact && state.level == 0 {
            state.compact();
            tracing::trace!(target: targets::EVENT_TABLE, "compacted after dispatch");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::OnceLock;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const T: EventType = EventType(10);

    fn counting(counter: &Arc<AtomicUsize>) -> Arc<dyn Listener> {
        let counter = counter.clone();
        Arc::new(move |_: &mut Event| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    fn recording(log: &Arc<Mutex<Vec<&'static str>>>, name: &'static str) -> Arc<dyn Listener> {
        let log = log.clone();
        Arc::new(move |_: &mut Event| log.lock().push(name))
    }

    #[test]
    fn test_hook_send_unhook() {
        let table = EventTable::new();
        let count = Arc::new(AtomicUsize::new(0));
        let listener = counting(&count);

        table.hook(T, listener.clone());
        table.send_event(&mut Event::new(T));
        assert_eq!(count.load(Ordering::SeqCst), 1);

        assert!(table.unhook(T, &listener));
        table.send_event(&mut Event::new(T));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_send_without_listeners_is_noop() {
        let table = EventTable::new();
        let mut event = Event::new(T);
        table.send_event(&mut event);
        assert!(event.doit);

        let count = Arc::new(AtomicUsize::new(0));
        table.hook(EventType::SELECTION, counting(&count));
        table.send_event(&mut event);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_listeners_keep_insertion_order_after_removals() {
        let table = EventTable::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let listeners: Vec<_> = ["a", "b", "c", "d", "e", "f"]
            .into_iter()
            .map(|name| recording(&log, name))
            .collect();

        for listener in &listeners {
            table.hook(T, listener.clone());
        }
        table.unhook(T, &listeners[1]);
        table.unhook(T, &listeners[4]);
        table.hook(T, listeners[1].clone());

        let snapshot = table.listeners(T);
        assert_eq!(snapshot.len(), 5);
        table.send_event(&mut Event::new(T));
        assert_eq!(*log.lock(), vec!["a", "c", "d", "f", "b"]);
    }

    #[test]
    fn test_duplicates_and_first_match_removal() {
        let table = EventTable::new();
        let count = Arc::new(AtomicUsize::new(0));
        let listener = counting(&count);
        table.hook(T, listener.clone());
        table.hook(T, listener.clone());
        assert_eq!(table.size(), 2);

        table.unhook(T, &listener);
        assert_eq!(table.size(), 1);
        assert!(table.hooks(T));
        assert!(!table.unhook(EventType::SELECTION, &listener));
    }

    #[test]
    fn test_listeners_for_unknown_type_is_empty() {
        let table = EventTable::new();
        assert!(table.listeners(T).is_empty());
        assert!(!table.hooks(T));
    }

    #[test]
    fn test_unhook_during_dispatch() {
        let table = Arc::new(EventTable::new());
        let log = Arc::new(Mutex::new(Vec::new()));
        let second = recording(&log, "second");
        let third = recording(&log, "third");

        let self_ref: Arc<OnceLock<Arc<dyn Listener>>> = Arc::new(OnceLock::new());
        let first: Arc<dyn Listener> = {
            let table = table.clone();
            let log = log.clone();
            let self_ref = self_ref.clone();
            Arc::new(move |_: &mut Event| {
                log.lock().push("first");
                if let Some(me) = self_ref.get() {
                    assert!(table.unhook(T, me));
                }
            })
        };
        let _ = self_ref.set(first.clone());

        table.hook(T, first.clone());
        table.hook(T, second);
        table.hook(T, third);

        table.send_event(&mut Event::new(T));
        assert_eq!(*log.lock(), vec!["first", "second", "third"]);
        assert_eq!(table.listeners(T).len(), 2);

        log.lock().clear();
        table.send_event(&mut Event::new(T));
        assert_eq!(*log.lock(), vec!["second", "third"]);
    }

    #[test]
    fn test_unhook_later_listener_during_dispatch_skips_it() {
        let table = Arc::new(EventTable::new());
        let log = Arc::new(Mutex::new(Vec::new()));
        let victim = recording(&log, "victim");
        let remover: Arc<dyn Listener> = {
            let table = table.clone();
            let victim = victim.clone();
            Arc::new(move |_: &mut Event| {
                table.unhook(T, &victim);
            })
        };
        table.hook(T, remover);
        table.hook(T, victim);

        table.send_event(&mut Event::new(T));
        assert!(log.lock().is_empty());
        assert_eq!(table.size(), 1);
    }

    #[test]
    fn test_dispatch_stops_when_type_reset() {
        let table = EventTable::new();
        let count = Arc::new(AtomicUsize::new(0));
        table.hook(T, Arc::new(|event: &mut Event| event.event_type = EventType::NONE));
        table.hook(T, counting(&count));

        table.send_event(&mut Event::new(T));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_hook_during_dispatch_reuses_tail_slot() {
        let table = Arc::new(EventTable::new());
        let count = Arc::new(AtomicUsize::new(0));
        let late = counting(&count);
        let hooker: Arc<dyn Listener> = {
            let table = table.clone();
            Arc::new(move |_: &mut Event| {
                if table.size() == 1 {
                    table.hook(T, late.clone());
                }
            })
        };
        table.hook(T, hooker);

        table.send_event(&mut Event::new(T));
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(table.size(), 2);
    }

    #[test]
    fn test_growth_beyond_chunk() {
        let table = EventTable::new();
        let count = Arc::new(AtomicUsize::new(0));
        for _ in 0..(GROW_SIZE * 3 + 1) {
            table.hook(T, counting(&count));
        }
        table.send_event(&mut Event::new(T));
        assert_eq!(count.load(Ordering::SeqCst), GROW_SIZE * 3 + 1);
    }

    #[test]
    fn test_panic_propagates_and_table_recovers() {
        let table = Arc::new(EventTable::new());
        let count = Arc::new(AtomicUsize::new(0));
        let failing: Arc<dyn Listener> = {
            let table = table.clone();
            Arc::new(move |_: &mut Event| {
                let me = table.listeners(T)[0].clone();
                if table.unhook(T, &me) {
                    panic!("listener failure");
                }
            })
        };
        table.hook(T, failing);
        table.hook(T, counting(&count));

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            table.send_event(&mut Event::new(T));
        }));
        assert!(result.is_err());
        assert_eq!(table.size(), 1);

        table.send_event(&mut Event::new(T));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_typed_hook_covers_every_code_and_unhooks_by_target() {
        use crate::typed::{FocusEvent, FocusListener};

        #[derive(Default)]
        struct Focus(AtomicUsize);
        impl FocusListener for Focus {
            fn focus_gained(&self, _event: &mut FocusEvent) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
            fn focus_lost(&self, _event: &mut FocusEvent) {
                self.0.fetch_add(10, Ordering::SeqCst);
            }
        }

        let table = EventTable::new();
        let focus = Arc::new(Focus::default());
        table.hook_typed(TypedCallback::Focus(focus.clone()));
        assert_eq!(table.size(), 2);

        table.send_event(&mut Event::new(EventType::FOCUS_IN));
        table.send_event(&mut Event::new(EventType::FOCUS_OUT));
        assert_eq!(focus.0.load(Ordering::SeqCst), 11);

        assert!(table.unhook_typed_all(&TypedCallback::Focus(focus.clone())));
        assert_eq!(table.size(), 0);
        assert!(!table.unhook_typed_all(&TypedCallback::Focus(focus)));
    }

    #[test]
    fn test_clear_during_dispatch_stops_remaining_listeners() {
        let table = Arc::new(EventTable::new());
        let count = Arc::new(AtomicUsize::new(0));
        let clearing: Arc<dyn Listener> = {
            let table = table.clone();
            Arc::new(move |_: &mut Event| table.clear())
        };
        table.hook(T, clearing);
        table.hook(T, counting(&count));

        table.send_event(&mut Event::new(T));
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(table.size(), 0);
    }
}
