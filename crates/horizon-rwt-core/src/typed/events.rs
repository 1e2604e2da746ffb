//! Typed event records handed to typed listeners.
//!
//! Each record is a copy of the relevant fields of the generic [`Event`]. The
//! fields listeners are allowed to change are copied back onto the generic
//! event after the callback returns (see [`TypedListener`](super::TypedListener)).

use crate::event::{Event, EventData, WidgetId};

macro_rules! typed_event {
    ($(
        $(#[$meta:meta])*
        $name:ident { $($field:ident : $ty:ty),* $(,)? }
    )*) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone)]
            pub struct $name {
                /// The widget that issued the event.
                pub widget: Option<WidgetId>,
                /// Client timestamp in milliseconds.
                pub time: i32,
                /// Application payload.
                pub data: Option<EventData>,
                $(pub $field: $ty,)*
            }

            impl From<&Event> for $name {
                fn from(event: &Event) -> Self {
                    Self {
                        widget: event.widget,
                        time: event.time,
                        data: event.data.clone(),
                        $($field: Clone::clone(&event.$field),)*
                    }
                }
            }
        )*
    };
}

typed_event! {
    /// A control was activated or deactivated.
    ActivateEvent {}

    /// A menu item was armed (highlighted).
    ArmEvent {}

    /// A control was moved or resized.
    ControlEvent {}

    /// A widget was disposed.
    DisposeEvent {}

    /// A drag gesture was detected.
    DragDetectEvent {
        button: i32,
        state_mask: i32,
        x: i32,
        y: i32,
        count: i32,
    }

    /// An expand-bar item was expanded or collapsed.
    ExpandEvent {
        item: Option<WidgetId>,
    }

    /// A control gained or lost focus.
    FocusEvent {}

    /// Help was requested for a control.
    HelpEvent {}

    /// A key was pressed or released.
    KeyEvent {
        character: char,
        key_code: i32,
        key_location: i32,
        state_mask: i32,
        doit: bool,
    }

    /// The context menu trigger occurred.
    MenuDetectEvent {
        x: i32,
        y: i32,
        detail: i32,
        doit: bool,
    }

    /// A menu was shown or hidden.
    MenuEvent {}

    /// Text was modified.
    ModifyEvent {}

    /// A mouse button, move, hover, or wheel occurrence.
    MouseEvent {
        button: i32,
        state_mask: i32,
        x: i32,
        y: i32,
        count: i32,
    }

    /// A control needs to be painted.
    PaintEvent {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        count: i32,
    }

    /// A selection occurred.
    SelectionEvent {
        item: Option<WidgetId>,
        detail: i32,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        state_mask: i32,
        text: Option<String>,
        doit: bool,
    }

    /// A shell state change.
    ShellEvent {
        doit: bool,
    }

    /// A traversal key was pressed.
    TraverseEvent {
        character: char,
        key_code: i32,
        key_location: i32,
        state_mask: i32,
        detail: i32,
        doit: bool,
    }

    /// A tree node was expanded or collapsed.
    TreeEvent {
        item: Option<WidgetId>,
        detail: i32,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        state_mask: i32,
        text: Option<String>,
        doit: bool,
    }

    /// Text is about to be modified.
    VerifyEvent {
        character: char,
        key_code: i32,
        key_location: i32,
        state_mask: i32,
        start: i32,
        end: i32,
        text: Option<String>,
        doit: bool,
    }
}
