//! The generic event record dispatched through event tables.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// An event type code.
///
/// Codes are an open set: the named constants cover the toolkit's built-in
/// events, and applications may dispatch custom codes of their own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventType(pub i32);

impl EventType {
    /// The null event type. Resetting an event's type to `NONE` during
    /// dispatch stops delivery to the remaining listeners.
    pub const NONE: Self = Self(0);
    pub const KEY_DOWN: Self = Self(1);
    pub const KEY_UP: Self = Self(2);
    pub const MOUSE_DOWN: Self = Self(3);
    pub const MOUSE_UP: Self = Self(4);
    pub const MOUSE_MOVE: Self = Self(5);
    pub const MOUSE_ENTER: Self = Self(6);
    pub const MOUSE_EXIT: Self = Self(7);
    pub const MOUSE_DOUBLE_CLICK: Self = Self(8);
    pub const PAINT: Self = Self(9);
    pub const MOVE: Self = Self(10);
    pub const RESIZE: Self = Self(11);
    pub const DISPOSE: Self = Self(12);
    pub const SELECTION: Self = Self(13);
    pub const DEFAULT_SELECTION: Self = Self(14);
    pub const FOCUS_IN: Self = Self(15);
    pub const FOCUS_OUT: Self = Self(16);
    pub const EXPAND: Self = Self(17);
    pub const COLLAPSE: Self = Self(18);
    pub const ICONIFY: Self = Self(19);
    pub const DEICONIFY: Self = Self(20);
    pub const CLOSE: Self = Self(21);
    pub const SHOW: Self = Self(22);
    pub const HIDE: Self = Self(23);
    pub const MODIFY: Self = Self(24);
    pub const VERIFY: Self = Self(25);
    pub const ACTIVATE: Self = Self(26);
    pub const DEACTIVATE: Self = Self(27);
    pub const HELP: Self = Self(28);
    pub const DRAG_DETECT: Self = Self(29);
    pub const ARM: Self = Self(30);
    pub const TRAVERSE: Self = Self(31);
    pub const MOUSE_HOVER: Self = Self(32);
    pub const MENU_DETECT: Self = Self(35);
    pub const SET_DATA: Self = Self(36);
    pub const MOUSE_WHEEL: Self = Self(37);
    pub const SETTINGS: Self = Self(39);
    pub const SKIN: Self = Self(45);

    /// Get the raw code.
    pub fn code(self) -> i32 {
        self.0
    }

    /// Whether this is the null event type.
    pub fn is_none(self) -> bool {
        self == Self::NONE
    }
}

impl From<i32> for EventType {
    fn from(code: i32) -> Self {
        Self(code)
    }
}

/// Opaque identifier of the widget (or item) an event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WidgetId(pub u64);

/// Free-form application payload attached to an event.
pub type EventData = Arc<dyn Any + Send + Sync>;

/// A single occurrence delivered to listeners.
///
/// Events are constructed fresh for each dispatch and may be mutated by the
/// listeners that receive them; in particular clearing `doit` is how a
/// listener vetoes the operation that caused the event.
#[derive(Clone)]
pub struct Event {
    /// The event type code.
    pub event_type: EventType,
    /// The widget that issued the event.
    pub widget: Option<WidgetId>,
    /// The item the event occurred in, if any.
    pub item: Option<WidgetId>,
    /// Index of the item, where applicable.
    pub index: i32,
    /// Event-specific detail code.
    pub detail: i32,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    /// Click count or similar counter.
    pub count: i32,
    /// Client timestamp in milliseconds. Zero means "not stamped yet".
    pub time: i32,
    /// Mouse button number.
    pub button: i32,
    /// The character typed, for key events.
    pub character: char,
    pub key_code: i32,
    pub key_location: i32,
    /// Modifier key / button state at the time of the event.
    pub state_mask: i32,
    /// Range start for text events.
    pub start: i32,
    /// Range end for text events.
    pub end: i32,
    /// Text for verify and similar events.
    pub text: Option<String>,
    /// Cleared by a listener to cancel the operation.
    pub doit: bool,
    /// Application payload.
    pub data: Option<EventData>,
}

impl Default for Event {
    fn default() -> Self {
        Self {
            event_type: EventType::NONE,
            widget: None,
            item: None,
            index: 0,
            detail: 0,
            x: 0,
            y: 0,
            width: 0,
            height: 0,
            count: 0,
            time: 0,
            button: 0,
            character: '\0',
            key_code: 0,
            key_location: 0,
            state_mask: 0,
            start: 0,
            end: 0,
            text: None,
            doit: true,
            data: None,
        }
    }
}

impl Event {
    /// Create an empty event of the given type.
    pub fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            ..Self::default()
        }
    }

    /// Create an event of the given type issued by `widget`.
    pub fn for_widget(event_type: EventType, widget: WidgetId) -> Self {
        Self {
            event_type,
            widget: Some(widget),
            ..Self::default()
        }
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("event_type", &self.event_type)
            .field("widget", &self.widget)
            .field("item", &self.item)
            .field("detail", &self.detail)
            .field("x", &self.x)
            .field("y", &self.y)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("time", &self.time)
            .field("state_mask", &self.state_mask)
            .field("text", &self.text)
            .field("doit", &self.doit)
            .field("has_data", &self.data.is_some())
            .finish_non_exhaustive()
    }
}
