//! Interaction events.
//!
//! An [`InteractionEvent`] is a classified input occurrence produced by the
//! rendering layer: a mouse press, a wheel step, a key press, or an internal
//! signal raised by an interactor. Every event carries an [`EventClass`] tag
//! and a payload; the class hierarchy is fixed:
//!
//! ```text
//! InteractionEvent
//! ├── InteractionPositionEvent
//! │   ├── MousePressEvent
//! │   ├── MouseReleaseEvent
//! │   ├── MouseDoubleClickEvent
//! │   ├── MouseMoveEvent
//! │   └── MouseWheelEvent
//! ├── InteractionKeyEvent
//! └── InternalEvent
//! ```
//!
//! # Template matching
//!
//! Event configurations describe *kinds* of events as template events. A
//! concrete event matches a template when both are the same variant and their
//! discriminating fields agree (see [`InteractionEvent::matches_template`]).
//! Positions are never compared, and wheel events only compare the direction
//! of the wheel delta.
//!
//! ```
//! use horizon_interact::event::{InteractionEvent, KeyboardModifiers, MouseButton, Point2};
//!
//! let template = InteractionEvent::mouse_press(Point2::default(), MouseButton::Left)
//!     .with_modifiers(KeyboardModifiers::CTRL);
//!
//! let click = InteractionEvent::mouse_press(Point2::new(120.0, 48.0), MouseButton::Left)
//!     .with_modifiers(KeyboardModifiers::CTRL);
//! assert!(click.matches_template(&template));
//!
//! let plain = InteractionEvent::mouse_press(Point2::new(120.0, 48.0), MouseButton::Left);
//! assert!(!plain.matches_template(&template));
//! ```

mod factory;

pub use factory::EventFactory;

use std::fmt;
use std::sync::{Arc, Weak};

use crate::dispatcher::InteractorId;

/// The symbolic class of an interaction event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventClass {
    /// Root of the hierarchy. Abstract.
    InteractionEvent,
    /// Any event with a display position. Abstract.
    InteractionPositionEvent,
    /// A mouse button was pressed.
    MousePressEvent,
    /// A mouse button was released.
    MouseReleaseEvent,
    /// A mouse button was double clicked.
    MouseDoubleClickEvent,
    /// The mouse moved.
    MouseMoveEvent,
    /// The mouse wheel turned.
    MouseWheelEvent,
    /// A key was pressed.
    InteractionKeyEvent,
    /// A signal raised by an interactor.
    InternalEvent,
}

impl EventClass {
    /// Every event class, roots first.
    pub const ALL: [EventClass; 9] = [
        EventClass::InteractionEvent,
        EventClass::InteractionPositionEvent,
        EventClass::MousePressEvent,
        EventClass::MouseReleaseEvent,
        EventClass::MouseDoubleClickEvent,
        EventClass::MouseMoveEvent,
        EventClass::MouseWheelEvent,
        EventClass::InteractionKeyEvent,
        EventClass::InternalEvent,
    ];

    /// The class name used in behavior and configuration documents.
    pub fn name(self) -> &'static str {
        match self {
            Self::InteractionEvent => "InteractionEvent",
            Self::InteractionPositionEvent => "InteractionPositionEvent",
            Self::MousePressEvent => "MousePressEvent",
            Self::MouseReleaseEvent => "MouseReleaseEvent",
            Self::MouseDoubleClickEvent => "MouseDoubleClickEvent",
            Self::MouseMoveEvent => "MouseMoveEvent",
            Self::MouseWheelEvent => "MouseWheelEvent",
            Self::InteractionKeyEvent => "InteractionKeyEvent",
            Self::InternalEvent => "InternalEvent",
        }
    }

    /// Look up a class by name, ignoring ASCII case.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|class| class.name().eq_ignore_ascii_case(name))
    }

    /// The direct super class, `None` for [`EventClass::InteractionEvent`].
    pub fn parent(self) -> Option<Self> {
        match self {
            Self::InteractionEvent => None,
            Self::InteractionPositionEvent | Self::InteractionKeyEvent | Self::InternalEvent => {
                Some(Self::InteractionEvent)
            }
            Self::MousePressEvent
            | Self::MouseReleaseEvent
            | Self::MouseDoubleClickEvent
            | Self::MouseMoveEvent
            | Self::MouseWheelEvent => Some(Self::InteractionPositionEvent),
        }
    }

    /// Whether `candidate` is this class or one of its descendants.
    pub fn is_super_class_of(self, candidate: EventClass) -> bool {
        let mut current = Some(candidate);
        while let Some(class) = current {
            if class == self {
                return true;
            }
            current = class.parent();
        }
        false
    }

    /// Whether events of this class can only exist through a subclass.
    pub fn is_abstract(self) -> bool {
        matches!(self, Self::InteractionEvent | Self::InteractionPositionEvent)
    }
}

impl fmt::Display for EventClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A point in display coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    /// Create a display point.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A point in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    /// Create a world point.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Point3) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// A mouse button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MouseButton {
    /// Primary button (usually left).
    Left = 0,
    /// Secondary button (usually right).
    Right = 1,
    /// Middle button (scroll wheel click).
    Middle = 2,
}

/// A set of held mouse buttons, stored as a bitmask (`1 << button`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MouseButtons(u8);

impl MouseButtons {
    /// No buttons held.
    pub const NONE: Self = Self(0);
    /// Only the left button held.
    pub const LEFT: Self = Self(1 << MouseButton::Left as u8);
    /// Only the right button held.
    pub const RIGHT: Self = Self(1 << MouseButton::Right as u8);
    /// Only the middle button held.
    pub const MIDDLE: Self = Self(1 << MouseButton::Middle as u8);

    /// The raw bitmask.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Whether `button` is held.
    pub const fn contains(self, button: MouseButton) -> bool {
        self.0 & (1 << button as u8) != 0
    }

    /// Add a held button.
    pub fn insert(&mut self, button: MouseButton) {
        self.0 |= 1 << button as u8;
    }

    /// Builder-style [`insert`](Self::insert).
    pub const fn with(self, button: MouseButton) -> Self {
        Self(self.0 | 1 << button as u8)
    }

    /// Whether no button is held.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl From<MouseButton> for MouseButtons {
    fn from(button: MouseButton) -> Self {
        Self::NONE.with(button)
    }
}

/// Keyboard modifiers held during an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct KeyboardModifiers {
    /// The Shift key is held.
    pub shift: bool,
    /// The Control key is held.
    pub control: bool,
    /// The Alt key is held.
    pub alt: bool,
    /// The Meta/Super key is held.
    pub meta: bool,
}

impl KeyboardModifiers {
    /// No modifiers pressed.
    pub const NONE: Self = Self {
        shift: false,
        control: false,
        alt: false,
        meta: false,
    };

    /// Shift modifier only.
    pub const SHIFT: Self = Self {
        shift: true,
        ..Self::NONE
    };

    /// Control modifier only.
    pub const CTRL: Self = Self {
        control: true,
        ..Self::NONE
    };

    /// Alt modifier only.
    pub const ALT: Self = Self {
        alt: true,
        ..Self::NONE
    };

    /// Meta modifier only.
    pub const META: Self = Self {
        meta: true,
        ..Self::NONE
    };

    /// Whether no modifier is held.
    pub fn is_empty(&self) -> bool {
        *self == Self::NONE
    }
}

/// The rendering context an event originates from.
///
/// Events refer to their sender weakly; the window layer owns the context.
#[derive(Debug)]
pub struct RenderContext {
    name: String,
}

impl RenderContext {
    /// Create a named rendering context.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// The context's name, e.g. `"axial"`.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Payload of mouse press, release, double-click and move events.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PointerEvent {
    /// Position in display coordinates.
    pub position: Point2,
    /// Position in world coordinates, if the render layer could compute one.
    pub world_position: Option<Point3>,
    /// The button that caused the event. `None` for move events.
    pub event_button: Option<MouseButton>,
    /// Buttons held in addition to the event button.
    pub button_state: MouseButtons,
    /// Held keyboard modifiers.
    pub modifiers: KeyboardModifiers,
}

/// Payload of mouse wheel events.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WheelEvent {
    /// Position, held buttons and modifiers.
    pub pointer: PointerEvent,
    /// Signed wheel delta. Only its sign takes part in matching.
    pub delta: i32,
}

/// Payload of key events.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct KeyEvent {
    /// Key identifier, e.g. `"A"`, `"Escape"` or `"ArrowUp"`.
    pub key: String,
    /// Held keyboard modifiers.
    pub modifiers: KeyboardModifiers,
    /// Mouse position at the time of the key press, if known.
    pub position: Option<Point2>,
    /// World position at the time of the key press, if known.
    pub world_position: Option<Point3>,
}

/// Payload of internal events.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InternalEvent {
    /// The signal name, used directly as the event variant.
    pub signal_name: String,
    /// The interactor that should receive the event. The handle is weak: the
    /// interactor may have been removed in the meantime.
    pub target: Option<InteractorId>,
}

/// The payload of an [`InteractionEvent`], one variant per concrete class.
#[derive(Debug, Clone, PartialEq)]
pub enum EventData {
    MousePress(PointerEvent),
    MouseRelease(PointerEvent),
    MouseDoubleClick(PointerEvent),
    MouseMove(PointerEvent),
    MouseWheel(WheelEvent),
    Key(KeyEvent),
    Internal(InternalEvent),
}

impl EventData {
    /// The concrete class of this payload.
    pub fn class(&self) -> EventClass {
        match self {
            Self::MousePress(_) => EventClass::MousePressEvent,
            Self::MouseRelease(_) => EventClass::MouseReleaseEvent,
            Self::MouseDoubleClick(_) => EventClass::MouseDoubleClickEvent,
            Self::MouseMove(_) => EventClass::MouseMoveEvent,
            Self::MouseWheel(_) => EventClass::MouseWheelEvent,
            Self::Key(_) => EventClass::InteractionKeyEvent,
            Self::Internal(_) => EventClass::InternalEvent,
        }
    }

    fn pointer(&self) -> Option<&PointerEvent> {
        match self {
            Self::MousePress(p)
            | Self::MouseRelease(p)
            | Self::MouseDoubleClick(p)
            | Self::MouseMove(p) => Some(p),
            Self::MouseWheel(w) => Some(&w.pointer),
            Self::Key(_) | Self::Internal(_) => None,
        }
    }

    fn pointer_mut(&mut self) -> Option<&mut PointerEvent> {
        match self {
            Self::MousePress(p)
            | Self::MouseRelease(p)
            | Self::MouseDoubleClick(p)
            | Self::MouseMove(p) => Some(p),
            Self::MouseWheel(w) => Some(&mut w.pointer),
            Self::Key(_) | Self::Internal(_) => None,
        }
    }
}

/// A classified input occurrence.
///
/// Events are plain values: they are created per input occurrence, owned by the
/// caller for the duration of dispatch, and only the button state and
/// modifiers can be changed after construction.
#[derive(Debug, Clone)]
pub struct InteractionEvent {
    sender: Weak<RenderContext>,
    data: EventData,
}

impl InteractionEvent {
    /// Create an event without sender.
    pub fn new(data: EventData) -> Self {
        Self {
            sender: Weak::new(),
            data,
        }
    }

    /// A mouse press of `button` at `position`.
    pub fn mouse_press(position: Point2, button: MouseButton) -> Self {
        Self::new(EventData::MousePress(PointerEvent {
            position,
            event_button: Some(button),
            ..PointerEvent::default()
        }))
    }

    /// A mouse release of `button` at `position`.
    pub fn mouse_release(position: Point2, button: MouseButton) -> Self {
        Self::new(EventData::MouseRelease(PointerEvent {
            position,
            event_button: Some(button),
            ..PointerEvent::default()
        }))
    }

    /// A double click of `button` at `position`.
    pub fn mouse_double_click(position: Point2, button: MouseButton) -> Self {
        Self::new(EventData::MouseDoubleClick(PointerEvent {
            position,
            event_button: Some(button),
            ..PointerEvent::default()
        }))
    }

    /// A mouse move to `position` while `buttons` are held.
    pub fn mouse_move(position: Point2, buttons: MouseButtons) -> Self {
        Self::new(EventData::MouseMove(PointerEvent {
            position,
            button_state: buttons,
            ..PointerEvent::default()
        }))
    }

    /// A wheel step at `position`. Positive deltas scroll up.
    pub fn wheel(position: Point2, delta: i32) -> Self {
        Self::new(EventData::MouseWheel(WheelEvent {
            pointer: PointerEvent {
                position,
                ..PointerEvent::default()
            },
            delta,
        }))
    }

    /// A key press.
    pub fn key(key: impl Into<String>) -> Self {
        Self::new(EventData::Key(KeyEvent {
            key: key.into(),
            ..KeyEvent::default()
        }))
    }

    /// An internal signal, optionally addressed to one interactor.
    pub fn internal(signal_name: impl Into<String>, target: Option<InteractorId>) -> Self {
        Self::new(EventData::Internal(InternalEvent {
            signal_name: signal_name.into(),
            target,
        }))
    }

    /// Attach the rendering context that produced the event.
    pub fn with_sender(mut self, sender: &Arc<RenderContext>) -> Self {
        self.sender = Arc::downgrade(sender);
        self
    }

    /// Builder-style [`set_modifiers`](Self::set_modifiers).
    pub fn with_modifiers(mut self, modifiers: KeyboardModifiers) -> Self {
        self.set_modifiers(modifiers);
        self
    }

    /// Builder-style [`set_button_state`](Self::set_button_state).
    pub fn with_button_state(mut self, buttons: MouseButtons) -> Self {
        self.set_button_state(buttons);
        self
    }

    /// Attach a world position. Ignored for internal events.
    pub fn with_world_position(mut self, world: Point3) -> Self {
        match &mut self.data {
            EventData::Key(key) => key.world_position = Some(world),
            data => {
                if let Some(pointer) = data.pointer_mut() {
                    pointer.world_position = Some(world);
                }
            }
        }
        self
    }

    /// Replace the held modifiers. Ignored for internal events.
    pub fn set_modifiers(&mut self, modifiers: KeyboardModifiers) {
        match &mut self.data {
            EventData::Key(key) => key.modifiers = modifiers,
            data => {
                if let Some(pointer) = data.pointer_mut() {
                    pointer.modifiers = modifiers;
                }
            }
        }
    }

    /// Replace the held buttons. Only mouse events carry a button state.
    pub fn set_button_state(&mut self, buttons: MouseButtons) {
        if let Some(pointer) = self.data.pointer_mut() {
            pointer.button_state = buttons;
        }
    }

    /// The concrete event class.
    pub fn class(&self) -> EventClass {
        self.data.class()
    }

    /// The event payload.
    pub fn data(&self) -> &EventData {
        &self.data
    }

    /// The rendering context that produced the event, if it is still alive.
    pub fn sender(&self) -> Option<Arc<RenderContext>> {
        self.sender.upgrade()
    }

    /// Display position, if the event has one.
    pub fn position(&self) -> Option<Point2> {
        match &self.data {
            EventData::Key(key) => key.position,
            data => data.pointer().map(|p| p.position),
        }
    }

    /// World position, if the render layer provided one.
    pub fn world_position(&self) -> Option<Point3> {
        match &self.data {
            EventData::Key(key) => key.world_position,
            data => data.pointer().and_then(|p| p.world_position),
        }
    }

    /// Held modifiers. Internal events report none.
    pub fn modifiers(&self) -> KeyboardModifiers {
        match &self.data {
            EventData::Key(key) => key.modifiers,
            data => data.pointer().map(|p| p.modifiers).unwrap_or_default(),
        }
    }

    /// Held mouse buttons. Non-mouse events report none.
    pub fn button_state(&self) -> MouseButtons {
        self.data
            .pointer()
            .map(|p| p.button_state)
            .unwrap_or_default()
    }

    /// The button that caused a press, release or double click.
    pub fn event_button(&self) -> Option<MouseButton> {
        self.data.pointer().and_then(|p| p.event_button)
    }

    /// Wheel delta of a wheel event.
    pub fn wheel_delta(&self) -> Option<i32> {
        match &self.data {
            EventData::MouseWheel(wheel) => Some(wheel.delta),
            _ => None,
        }
    }

    /// Key identifier of a key event.
    pub fn key_name(&self) -> Option<&str> {
        match &self.data {
            EventData::Key(key) => Some(&key.key),
            _ => None,
        }
    }

    /// Signal name of an internal event.
    pub fn signal_name(&self) -> Option<&str> {
        match &self.data {
            EventData::Internal(internal) => Some(&internal.signal_name),
            _ => None,
        }
    }

    /// Target interactor of an internal event.
    pub fn internal_target(&self) -> Option<InteractorId> {
        match &self.data {
            EventData::Internal(internal) => internal.target,
            _ => None,
        }
    }

    /// Whether this event is an internal signal.
    pub fn is_internal(&self) -> bool {
        matches!(self.data, EventData::Internal(_))
    }

    /// Whether this event matches `template`.
    ///
    /// Both must be the same variant. Press, release and double-click events
    /// compare event button, button state and modifiers; move events compare
    /// button state and modifiers; wheel events compare button state, modifiers
    /// and the sign of the delta; key events compare key and modifiers;
    /// internal events compare the signal name. Positions are never compared.
    pub fn matches_template(&self, template: &InteractionEvent) -> bool {
        use EventData::*;

        match (&self.data, &template.data) {
            (MousePress(a), MousePress(b))
            | (MouseRelease(a), MouseRelease(b))
            | (MouseDoubleClick(a), MouseDoubleClick(b)) => {
                a.event_button == b.event_button
                    && a.button_state == b.button_state
                    && a.modifiers == b.modifiers
            }
            (MouseMove(a), MouseMove(b)) => {
                a.button_state == b.button_state && a.modifiers == b.modifiers
            }
            (MouseWheel(a), MouseWheel(b)) => {
                a.delta.signum() == b.delta.signum()
                    && a.pointer.button_state == b.pointer.button_state
                    && a.pointer.modifiers == b.pointer.modifiers
            }
            (Key(a), Key(b)) => a.key == b.key && a.modifiers == b.modifiers,
            (Internal(a), Internal(b)) => a.signal_name == b.signal_name,
            _ => false,
        }
    }
}
