//! Building template events from configuration attributes.

use horizon_interact_core::PropertyList;
use horizon_interact_core::logging::targets;

use super::{
    EventClass, EventData, InteractionEvent, InternalEvent, KeyEvent, KeyboardModifiers,
    MouseButton, MouseButtons, PointerEvent, WheelEvent,
};
use crate::error::{Error, Result};

/// Attribute naming the button that caused a press, release or double click.
pub const EVENT_BUTTON: &str = "EventButton";
/// Attribute listing the held buttons, comma separated.
pub const BUTTON_STATE: &str = "ButtonState";
/// Attribute listing the held modifiers, comma separated.
pub const MODIFIERS: &str = "Modifiers";
/// Attribute naming the key of a key event.
pub const KEY: &str = "Key";
/// Attribute giving the wheel direction, `up` or `down`.
pub const SCROLL_DIRECTION: &str = "ScrollDirection";
/// Attribute giving a signed wheel delta.
pub const WHEEL_DELTA: &str = "WheelDelta";
/// Attribute naming the signal of an internal event.
pub const SIGNAL_NAME: &str = "SignalName";

/// Creates template events for event configurations.
///
/// Attribute names and enumerated values are case-insensitive:
///
/// ```
/// use horizon_interact::event::{EventFactory, KeyboardModifiers, MouseButton};
/// use horizon_interact_core::PropertyList;
///
/// let attributes: PropertyList = [
///     ("EventButton", "LeftMouseButton"),
///     ("modifiers", "CTRL,shift"),
/// ]
/// .into_iter()
/// .collect();
///
/// let template = EventFactory::create_event("MousePressEvent", &attributes).unwrap();
/// assert_eq!(template.event_button(), Some(MouseButton::Left));
/// assert!(template.modifiers().control && template.modifiers().shift);
/// ```
pub struct EventFactory;

impl EventFactory {
    /// Create a template event of class `class_name` from `attributes`.
    ///
    /// Fails with [`Error::UnknownEventClass`] for unknown or abstract classes and
    /// with [`Error::InvalidAttribute`] for values that cannot be interpreted.
    /// Attributes that do not apply to the class are ignored. A wheel template
    /// needs exactly one of `ScrollDirection` or a non-zero `WheelDelta`.
    pub fn create_event(class_name: &str, attributes: &PropertyList) -> Result<InteractionEvent> {
        let class = EventClass::from_name(class_name)
            .filter(|class| !class.is_abstract())
            .ok_or_else(|| Error::UnknownEventClass(class_name.to_string()))?;

        let mut event_button = None;
        let mut button_state = MouseButtons::NONE;
        let mut modifiers = KeyboardModifiers::NONE;
        let mut key = None;
        let mut scroll_direction = None;
        let mut wheel_delta = None;
        let mut signal_name = None;

        for (name, value) in attributes.iter() {
            let value = value.to_string();
            let value = value.trim();
            if name.eq_ignore_ascii_case(EVENT_BUTTON) {
                event_button =
                    parse_button(value).ok_or_else(|| Error::invalid_attribute(name, value))?;
            } else if name.eq_ignore_ascii_case(BUTTON_STATE) {
                button_state = parse_button_state(value)
                    .ok_or_else(|| Error::invalid_attribute(name, value))?;
            } else if name.eq_ignore_ascii_case(MODIFIERS) {
                modifiers =
                    parse_modifiers(value).ok_or_else(|| Error::invalid_attribute(name, value))?;
            } else if name.eq_ignore_ascii_case(KEY) {
                key = Some(value.to_string());
            } else if name.eq_ignore_ascii_case(SCROLL_DIRECTION) {
                scroll_direction = match value.to_ascii_lowercase().as_str() {
                    "up" => Some(1),
                    "down" => Some(-1),
                    _ => return Err(Error::invalid_attribute(name, value)),
                };
            } else if name.eq_ignore_ascii_case(WHEEL_DELTA) {
                wheel_delta = Some(
                    value
                        .parse::<i32>()
                        .map_err(|_| Error::invalid_attribute(name, value))?,
                );
            } else if name.eq_ignore_ascii_case(SIGNAL_NAME) {
                signal_name = Some(value.to_string());
            } else {
                tracing::debug!(target: targets::CONFIG, class = %class, attribute = name, "ignoring unknown event attribute");
            }
        }

        let pointer = PointerEvent {
            event_button,
            button_state,
            modifiers,
            ..PointerEvent::default()
        };

        let data = match class {
            EventClass::MousePressEvent => EventData::MousePress(pointer),
            EventClass::MouseReleaseEvent => EventData::MouseRelease(pointer),
            EventClass::MouseDoubleClickEvent => EventData::MouseDoubleClick(pointer),
            EventClass::MouseMoveEvent => EventData::MouseMove(PointerEvent {
                event_button: None,
                ..pointer
            }),
            EventClass::MouseWheelEvent => {
                let delta = match (scroll_direction, wheel_delta) {
                    (Some(_), Some(delta)) | (None, Some(delta @ 0)) => {
                        return Err(Error::invalid_attribute(WHEEL_DELTA, delta.to_string()));
                    }
                    (Some(delta), None) | (None, Some(delta)) => delta,
                    (None, None) => return Err(Error::invalid_attribute(SCROLL_DIRECTION, "")),
                };
                EventData::MouseWheel(WheelEvent {
                    pointer: PointerEvent {
                        event_button: None,
                        ..pointer
                    },
                    delta,
                })
            }
            EventClass::InteractionKeyEvent => {
                let key = key
                    .filter(|k| !k.is_empty())
                    .ok_or_else(|| Error::invalid_attribute(KEY, ""))?;
                EventData::Key(KeyEvent {
                    key,
                    modifiers,
                    ..KeyEvent::default()
                })
            }
            EventClass::InternalEvent => {
                let signal_name = signal_name
                    .filter(|s| !s.is_empty())
                    .ok_or_else(|| Error::invalid_attribute(SIGNAL_NAME, ""))?;
                EventData::Internal(InternalEvent {
                    signal_name,
                    target: None,
                })
            }
            EventClass::InteractionEvent | EventClass::InteractionPositionEvent => {
                return Err(Error::UnknownEventClass(class_name.to_string()));
            }
        };

        Ok(InteractionEvent::new(data))
    }
}

/// Parse a single button name. `Some(None)` means "no button".
fn parse_button(value: &str) -> Option<Option<MouseButton>> {
    match value.to_ascii_lowercase().as_str() {
        "leftmousebutton" | "left" => Some(Some(MouseButton::Left)),
        "rightmousebutton" | "right" => Some(Some(MouseButton::Right)),
        "middlemousebutton" | "middle" => Some(Some(MouseButton::Middle)),
        "nobutton" | "none" | "" => Some(None),
        _ => None,
    }
}

fn parse_button_state(value: &str) -> Option<MouseButtons> {
    let mut buttons = MouseButtons::NONE;
    for part in value.split(',') {
        if let Some(button) = parse_button(part.trim())? {
            buttons.insert(button);
        }
    }
    Some(buttons)
}

fn parse_modifiers(value: &str) -> Option<KeyboardModifiers> {
    let mut modifiers = KeyboardModifiers::NONE;
    for part in value.split(',') {
        match part.trim().to_ascii_lowercase().as_str() {
            "ctrl" | "control" => modifiers.control = true,
            "alt" => modifiers.alt = true,
            "shift" => modifiers.shift = true,
            "meta" => modifiers.meta = true,
            "none" | "" => {}
            _ => return None,
        }
    }
    Some(modifiers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Point2;

    fn attrs(pairs: &[(&str, &str)]) -> PropertyList {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_press_template() {
        let template = EventFactory::create_event(
            "MousePressEvent",
            &attrs(&[("EventButton", "right"), ("ButtonState", "LeftMouseButton")]),
        )
        .unwrap();
        assert_eq!(template.class(), EventClass::MousePressEvent);
        assert_eq!(template.event_button(), Some(MouseButton::Right));
        assert_eq!(template.button_state(), MouseButtons::LEFT);

        let event = InteractionEvent::mouse_press(Point2::new(4.0, 4.0), MouseButton::Right)
            .with_button_state(MouseButtons::LEFT);
        assert!(event.matches_template(&template));
    }

    #[test]
    fn test_wheel_direction() {
        let up =
            EventFactory::create_event("MouseWheelEvent", &attrs(&[("ScrollDirection", "Up")]))
                .unwrap();
        let down =
            EventFactory::create_event("mousewheelevent", &attrs(&[("scrolldirection", "down")]))
                .unwrap();
        assert_eq!(up.wheel_delta(), Some(1));
        assert_eq!(down.wheel_delta(), Some(-1));

        let delta =
            EventFactory::create_event("MouseWheelEvent", &attrs(&[("WheelDelta", "-120")]))
                .unwrap();
        assert!(InteractionEvent::wheel(Point2::default(), -3).matches_template(&delta));
    }

    #[test]
    fn test_wheel_needs_one_direction() {
        let err = EventFactory::create_event("MouseWheelEvent", &PropertyList::new()).unwrap_err();
        assert!(matches!(err, Error::InvalidAttribute { ref name, .. } if name == SCROLL_DIRECTION));

        let err = EventFactory::create_event("MouseWheelEvent", &attrs(&[("WheelDelta", "0")]))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidAttribute { ref name, ref value } if name == WHEEL_DELTA && value == "0"));

        // Both attributes together are ambiguous whatever order they are read in.
        let both = attrs(&[("ScrollDirection", "up"), ("WheelDelta", "-120")]);
        for _ in 0..8 {
            let err = EventFactory::create_event("MouseWheelEvent", &both).unwrap_err();
            assert!(matches!(err, Error::InvalidAttribute { ref name, .. } if name == WHEEL_DELTA));
        }

        // Other classes ignore wheel attributes.
        assert!(EventFactory::create_event("MouseMoveEvent", &both).is_ok());
    }

    #[test]
    fn test_key_and_internal() {
        let key = EventFactory::create_event(
            "InteractionKeyEvent",
            &attrs(&[("Key", "Z"), ("Modifiers", "ctrl")]),
        )
        .unwrap();
        assert_eq!(key.key_name(), Some("Z"));
        assert_eq!(key.modifiers(), KeyboardModifiers::CTRL);

        let internal =
            EventFactory::create_event("InternalEvent", &attrs(&[("SignalName", "Done")])).unwrap();
        assert_eq!(internal.signal_name(), Some("Done"));
    }

    #[test]
    fn test_unknown_and_abstract_classes() {
        for class in ["TouchEvent", "InteractionEvent", "InteractionPositionEvent"] {
            let err = EventFactory::create_event(class, &PropertyList::new()).unwrap_err();
            assert!(matches!(err, Error::UnknownEventClass(name) if name == class));
        }
    }

    #[test]
    fn test_invalid_values() {
        let err = EventFactory::create_event("MousePressEvent", &attrs(&[("EventButton", "Thumb")]))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidAttribute { ref name, ref value } if name == "EventButton" && value == "Thumb"));

        assert!(EventFactory::create_event("MouseMoveEvent", &attrs(&[("Modifiers", "hyper")])).is_err());
        assert!(EventFactory::create_event("MouseWheelEvent", &attrs(&[("ScrollDirection", "left")])).is_err());
        assert!(EventFactory::create_event("InteractionKeyEvent", &PropertyList::new()).is_err());
        assert!(EventFactory::create_event("InternalEvent", &PropertyList::new()).is_err());
    }

    #[test]
    fn test_irrelevant_attributes_are_ignored() {
        let moved = EventFactory::create_event(
            "MouseMoveEvent",
            &attrs(&[("EventButton", "left"), ("PositionOnScreen", "10,10")]),
        )
        .unwrap();
        assert_eq!(moved.event_button(), None);
        assert!(InteractionEvent::mouse_move(Point2::default(), MouseButtons::NONE).matches_template(&moved));
    }
}
