//! Typed listeners layered over the generic [`Listener`] mechanism.
//!
//! A [`TypedListener`] adapts one strongly-typed listener to the generic
//! `handle_event` callback. Which interface the wrapped object is invoked
//! through is decided by the [`TypedCallback`] variant chosen at registration
//! time. This matters for event codes shared by two interfaces:
//!
//! | Event code              | Interfaces                          |
//! |-------------------------|-------------------------------------|
//! | `EXPAND`, `COLLAPSE`    | [`TreeListener`], [`ExpandListener`] |
//! | `ACTIVATE`, `DEACTIVATE`| [`ShellListener`], [`ActivateListener`] |
//!
//! After the typed callback returns, the fields a typed listener may change
//! (`doit`, coordinates, `detail`, replacement `text`) are copied back onto
//! the generic event, which keeps propagating to the remaining listeners.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use horizon_rwt_core::{Event, EventTable, EventType, TypedCallback};
//! use horizon_rwt_core::typed::VerifyEvent;
//!
//! let table = EventTable::new();
//! let upper_case = |event: &mut VerifyEvent| {
//!     event.text = event.text.as_ref().map(|text| text.to_uppercase());
//! };
//! table.hook_typed(TypedCallback::Verify(Arc::new(upper_case)));
//!
//! let mut event = Event::new(EventType::VERIFY);
//! event.text = Some("abc".to_string());
//! table.send_event(&mut event);
//! assert_eq!(event.text.as_deref(), Some("ABC"));
//! ```

mod events;
mod listeners;

use std::fmt;
use std::sync::Arc;

pub use events::*;
pub use listeners::*;

use crate::event::{Event, EventType};
use crate::listener::Listener;
use crate::logging::targets;

/// The capability a typed listener was registered under.
#[derive(Clone)]
pub enum TypedCallback {
    Activate(Arc<dyn ActivateListener>),
    Arm(Arc<dyn ArmListener>),
    Control(Arc<dyn ControlListener>),
    Dispose(Arc<dyn DisposeListener>),
    DragDetect(Arc<dyn DragDetectListener>),
    Expand(Arc<dyn ExpandListener>),
    Focus(Arc<dyn FocusListener>),
    Help(Arc<dyn HelpListener>),
    Key(Arc<dyn KeyListener>),
    MenuDetect(Arc<dyn MenuDetectListener>),
    Menu(Arc<dyn MenuListener>),
    Modify(Arc<dyn ModifyListener>),
    Mouse(Arc<dyn MouseListener>),
    MouseMove(Arc<dyn MouseMoveListener>),
    MouseTrack(Arc<dyn MouseTrackListener>),
    MouseWheel(Arc<dyn MouseWheelListener>),
    Paint(Arc<dyn PaintListener>),
    Selection(Arc<dyn SelectionListener>),
    Shell(Arc<dyn ShellListener>),
    Traverse(Arc<dyn TraverseListener>),
    Tree(Arc<dyn TreeListener>),
    Verify(Arc<dyn VerifyListener>),
}

impl TypedCallback {
    /// The event codes this capability receives.
    pub fn event_types(&self) -> &'static [EventType] {
        match self {
            Self::Activate(_) => &[EventType::ACTIVATE, EventType::DEACTIVATE],
            Self::Arm(_) => &[EventType::ARM],
            Self::Control(_) => &[EventType::MOVE, EventType::RESIZE],
            Self::Dispose(_) => &[EventType::DISPOSE],
            Self::DragDetect(_) => &[EventType::DRAG_DETECT],
            Self::Expand(_) | Self::Tree(_) => &[EventType::EXPAND, EventType::COLLAPSE],
            Self::Focus(_) => &[EventType::FOCUS_IN, EventType::FOCUS_OUT],
            Self::Help(_) => &[EventType::HELP],
            Self::Key(_) => &[EventType::KEY_DOWN, EventType::KEY_UP],
            Self::MenuDetect(_) => &[EventType::MENU_DETECT],
            Self::Menu(_) => &[EventType::SHOW, EventType::HIDE],
            Self::Modify(_) => &[EventType::MODIFY],
            Self::Mouse(_) => &[
                EventType::MOUSE_DOWN,
                EventType::MOUSE_UP,
                EventType::MOUSE_DOUBLE_CLICK,
            ],
            Self::MouseMove(_) => &[EventType::MOUSE_MOVE],
            Self::MouseTrack(_) => &[
                EventType::MOUSE_ENTER,
                EventType::MOUSE_EXIT,
                EventType::MOUSE_HOVER,
            ],
            Self::MouseWheel(_) => &[EventType::MOUSE_WHEEL],
            Self::Paint(_) => &[EventType::PAINT],
            Self::Selection(_) => &[EventType::SELECTION, EventType::DEFAULT_SELECTION],
            Self::Shell(_) => &[
                EventType::ACTIVATE,
                EventType::CLOSE,
                EventType::DEACTIVATE,
                EventType::DEICONIFY,
                EventType::ICONIFY,
            ],
            Self::Traverse(_) => &[EventType::TRAVERSE],
            Self::Verify(_) => &[EventType::VERIFY],
        }
    }

    fn target_ptr(&self) -> *const () {
        match self {
            Self::Activate(l) => Arc::as_ptr(l).cast(),
            Self::Arm(l) => Arc::as_ptr(l).cast(),
            Self::Control(l) => Arc::as_ptr(l).cast(),
            Self::Dispose(l) => Arc::as_ptr(l).cast(),
            Self::DragDetect(l) => Arc::as_ptr(l).cast(),
            Self::Expand(l) => Arc::as_ptr(l).cast(),
            Self::Focus(l) => Arc::as_ptr(l).cast(),
            Self::Help(l) => Arc::as_ptr(l).cast(),
            Self::Key(l) => Arc::as_ptr(l).cast(),
            Self::MenuDetect(l) => Arc::as_ptr(l).cast(),
            Self::Menu(l) => Arc::as_ptr(l).cast(),
            Self::Modify(l) => Arc::as_ptr(l).cast(),
            Self::Mouse(l) => Arc::as_ptr(l).cast(),
            Self::MouseMove(l) => Arc::as_ptr(l).cast(),
            Self::MouseTrack(l) => Arc::as_ptr(l).cast(),
            Self::MouseWheel(l) => Arc::as_ptr(l).cast(),
            Self::Paint(l) => Arc::as_ptr(l).cast(),
            Self::Selection(l) => Arc::as_ptr(l).cast(),
            Self::Shell(l) => Arc::as_ptr(l).cast(),
            Self::Traverse(l) => Arc::as_ptr(l).cast(),
            Self::Tree(l) => Arc::as_ptr(l).cast(),
            Self::Verify(l) => Arc::as_ptr(l).cast(),
        }
    }

    /// Whether both callbacks wrap the same listener object, regardless of
    /// the capability each was registered under.
    pub fn same_target(&self, other: &TypedCallback) -> bool {
        std::ptr::eq(self.target_ptr(), other.target_ptr())
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Activate(_) => "Activate",
            Self::Arm(_) => "Arm",
            Self::Control(_) => "Control",
            Self::Dispose(_) => "Dispose",
            Self::DragDetect(_) => "DragDetect",
            Self::Expand(_) => "Expand",
            Self::Focus(_) => "Focus",
            Self::Help(_) => "Help",
            Self::Key(_) => "Key",
            Self::MenuDetect(_) => "MenuDetect",
            Self::Menu(_) => "Menu",
            Self::Modify(_) => "Modify",
            Self::Mouse(_) => "Mouse",
            Self::MouseMove(_) => "MouseMove",
            Self::MouseTrack(_) => "MouseTrack",
            Self::MouseWheel(_) => "MouseWheel",
            Self::Paint(_) => "Paint",
            Self::Selection(_) => "Selection",
            Self::Shell(_) => "Shell",
            Self::Traverse(_) => "Traverse",
            Self::Tree(_) => "Tree",
            Self::Verify(_) => "Verify",
        }
    }
}

impl fmt::Debug for TypedCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple(self.name()).field(&self.target_ptr()).finish()
    }
}

/// Adapts a typed listener to the generic [`Listener`] interface.
#[derive(Debug, Clone)]
pub struct TypedListener {
    callback: TypedCallback,
}

impl TypedListener {
    /// Wrap `callback`.
    pub fn new(callback: TypedCallback) -> Self {
        Self { callback }
    }

    /// The wrapped typed listener.
    pub fn callback(&self) -> &TypedCallback {
        &self.callback
    }
}

impl From<TypedCallback> for TypedListener {
    fn from(callback: TypedCallback) -> Self {
        Self::new(callback)
    }
}

impl Listener for TypedListener {
    fn handle_event(&self, e: &mut Event) {
        use TypedCallback as C;

        match (e.event_type, &self.callback) {
            (EventType::ACTIVATE, C::Activate(l)) => l.activated(&mut ActivateEvent::from(&*e)),
            (EventType::ACTIVATE, C::Shell(l)) => l.shell_activated(&mut ShellEvent::from(&*e)),
            (EventType::ARM, C::Arm(l)) => l.widget_armed(&mut ArmEvent::from(&*e)),
            (EventType::CLOSE, C::Shell(l)) => {
                let mut event = ShellEvent::from(&*e);
                l.shell_closed(&mut event);
                e.doit = event.doit;
            }
            (EventType::COLLAPSE, C::Tree(l)) => l.tree_collapsed(&mut TreeEvent::from(&*e)),
            (EventType::COLLAPSE, C::Expand(l)) => l.item_collapsed(&mut ExpandEvent::from(&*e)),
            (EventType::DEACTIVATE, C::Activate(l)) => {
                l.deactivated(&mut ActivateEvent::from(&*e))
            }
            (EventType::DEACTIVATE, C::Shell(l)) => {
                l.shell_deactivated(&mut ShellEvent::from(&*e))
            }
            (EventType::DEFAULT_SELECTION, C::Selection(l)) => {
                l.widget_default_selected(&mut SelectionEvent::from(&*e))
            }
            (EventType::DEICONIFY, C::Shell(l)) => {
                l.shell_deiconified(&mut ShellEvent::from(&*e))
            }
            (EventType::DISPOSE, C::Dispose(l)) => l.widget_disposed(&mut DisposeEvent::from(&*e)),
            (EventType::DRAG_DETECT, C::DragDetect(l)) => {
                l.drag_detected(&mut DragDetectEvent::from(&*e))
            }
            (EventType::EXPAND, C::Tree(l)) => l.tree_expanded(&mut TreeEvent::from(&*e)),
            (EventType::EXPAND, C::Expand(l)) => l.item_expanded(&mut ExpandEvent::from(&*e)),
            (EventType::FOCUS_IN, C::Focus(l)) => l.focus_gained(&mut FocusEvent::from(&*e)),
            (EventType::FOCUS_OUT, C::Focus(l)) => l.focus_lost(&mut FocusEvent::from(&*e)),
            (EventType::HELP, C::Help(l)) => l.help_requested(&mut HelpEvent::from(&*e)),
            (EventType::HIDE, C::Menu(l)) => l.menu_hidden(&mut MenuEvent::from(&*e)),
            (EventType::ICONIFY, C::Shell(l)) => l.shell_iconified(&mut ShellEvent::from(&*e)),
            (EventType::KEY_DOWN, C::Key(l)) => {
                let mut event = KeyEvent::from(&*e);
                l.key_pressed(&mut event);
                e.doit = event.doit;
            }
            (EventType::KEY_UP, C::Key(l)) => {
                let mut event = KeyEvent::from(&*e);
                l.key_released(&mut event);
                e.doit = event.doit;
            }
            (EventType::MENU_DETECT, C::MenuDetect(l)) => {
                let mut event = MenuDetectEvent::from(&*e);
                l.menu_detected(&mut event);
                e.x = event.x;
                e.y = event.y;
                e.doit = event.doit;
            }
            (EventType::MODIFY, C::Modify(l)) => l.modify_text(&mut ModifyEvent::from(&*e)),
            (EventType::MOUSE_DOUBLE_CLICK, C::Mouse(l)) => {
                l.mouse_double_click(&mut MouseEvent::from(&*e))
            }
            (EventType::MOUSE_DOWN, C::Mouse(l)) => l.mouse_down(&mut MouseEvent::from(&*e)),
            (EventType::MOUSE_UP, C::Mouse(l)) => l.mouse_up(&mut MouseEvent::from(&*e)),
            (EventType::MOUSE_ENTER, C::MouseTrack(l)) => {
                l.mouse_enter(&mut MouseEvent::from(&*e))
            }
            (EventType::MOUSE_EXIT, C::MouseTrack(l)) => l.mouse_exit(&mut MouseEvent::from(&*e)),
            (EventType::MOUSE_HOVER, C::MouseTrack(l)) => {
                l.mouse_hover(&mut MouseEvent::from(&*e))
            }
            (EventType::MOUSE_MOVE, C::MouseMove(l)) => l.mouse_move(&mut MouseEvent::from(&*e)),
            (EventType::MOUSE_WHEEL, C::MouseWheel(l)) => {
                l.mouse_scrolled(&mut MouseEvent::from(&*e))
            }
            (EventType::MOVE, C::Control(l)) => l.control_moved(&mut ControlEvent::from(&*e)),
            (EventType::PAINT, C::Paint(l)) => l.paint_control(&mut PaintEvent::from(&*e)),
            (EventType::RESIZE, C::Control(l)) => l.control_resized(&mut ControlEvent::from(&*e)),
            (EventType::SELECTION, C::Selection(l)) => {
                let mut event = SelectionEvent::from(&*e);
                l.widget_selected(&mut event);
                e.x = event.x;
                e.y = event.y;
                e.doit = event.doit;
            }
            (EventType::SHOW, C::Menu(l)) => l.menu_shown(&mut MenuEvent::from(&*e)),
            (EventType::TRAVERSE, C::Traverse(l)) => {
                let mut event = TraverseEvent::from(&*e);
                l.key_traversed(&mut event);
                e.detail = event.detail;
                e.doit = event.doit;
            }
            (EventType::VERIFY, C::Verify(l)) => {
                let mut event = VerifyEvent::from(&*e);
                l.verify_text(&mut event);
                e.text = event.text;
                e.doit = event.doit;
            }
            (event_type, callback) => {
                tracing::trace!(
                    target: targets::TYPED,
                    event_type = event_type.code(),
                    capability = callback.name(),
                    "event not served by typed listener"
                );
            }
        }
    }

    fn as_typed(&self) -> Option<&TypedListener> {
        Some(self)
    }
}
