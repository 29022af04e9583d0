//! Reading behavior documents.
//!
//! ```xml
//! <statemachine NAME="ContourTool">
//!   <state name="Start" startstate="true">
//!     <transition event_class="MousePressEvent" event_variant="PrimaryButtonPressed" target="Drawing">
//!       <condition name="IsOverImage"/>
//!       <action name="InitContour">
//!         <parameter name="smoothing" value="2"/>
//!       </action>
//!     </transition>
//!   </state>
//!   <state name="Drawing" mode="GRAB_INPUT">
//!     ...
//!   </state>
//! </statemachine>
//! ```

use std::collections::HashMap;

use horizon_interact_core::logging::targets;

use super::{Action, Behavior, BehaviorBuilder, Condition, StateMode, TransitionSpec};
use crate::error::{Error, Result};
use crate::event::EventClass;
use crate::xml::{self, XmlEvent, XmlReader};

const STATEMACHINE_ELEMENT: &str = "statemachine";
const STATE_ELEMENT: &str = "state";
const TRANSITION_ELEMENT: &str = "transition";
const CONDITION_ELEMENT: &str = "condition";
const ACTION_ELEMENT: &str = "action";
const PARAMETER_ELEMENT: &str = "parameter";

struct Loader {
    builder: BehaviorBuilder,
    seen_root: bool,
    state: Option<String>,
    transition: Option<TransitionSpec>,
    action: Option<Action>,
}

pub(super) fn parse_behavior(name: &str, text: &str) -> Result<Behavior> {
    let mut reader = XmlReader::from_str(text);
    let mut loader = Loader {
        builder: BehaviorBuilder::new(name),
        seen_root: false,
        state: None,
        transition: None,
        action: None,
    };

    while let Some(event) = reader.next()? {
        match event {
            XmlEvent::StartElement { name, attributes } => {
                loader.start_element(&name, &attributes)?;
            }
            XmlEvent::EmptyElement { name, attributes } => {
                loader.start_element(&name, &attributes)?;
                loader.end_element(&name);
            }
            XmlEvent::EndElement { name } => loader.end_element(&name),
            XmlEvent::Text(_) => {}
        }
    }

    if !loader.seen_root {
        return Err(loader.invalid(format!("missing <{STATEMACHINE_ELEMENT}> root element")));
    }
    let behavior = loader.builder.build()?;
    tracing::debug!(
        target: targets::BEHAVIOR,
        behavior = behavior.name(),
        states = behavior.len(),
        "behavior parsed"
    );
    Ok(behavior)
}

impl Loader {
    fn invalid(&self, message: impl Into<String>) -> Error {
        Error::invalid_behavior(self.builder.name(), message)
    }

    fn required<'a>(
        &self,
        attributes: &'a HashMap<String, String>,
        element: &str,
        attribute: &str,
    ) -> Result<&'a str> {
        xml::attribute(attributes, attribute)
            .ok_or_else(|| self.invalid(format!("<{element}> requires a '{attribute}' attribute")))
    }

    fn flag(&self, attributes: &HashMap<String, String>, attribute: &str) -> Result<bool> {
        match xml::attribute(attributes, attribute) {
            None => Ok(false),
            Some(value) if value.eq_ignore_ascii_case("true") => Ok(true),
            Some(value) if value.eq_ignore_ascii_case("false") => Ok(false),
            Some(value) => Err(self.invalid(format!("'{attribute}' must be true or false, got '{value}'"))),
        }
    }

    fn start_element(&mut self, element: &str, attributes: &HashMap<String, String>) -> Result<()> {
        if element.eq_ignore_ascii_case(STATEMACHINE_ELEMENT) {
            if let Some(name) = xml::attribute(attributes, "name") {
                self.builder.set_name(name);
            }
            self.seen_root = true;
        } else if element.eq_ignore_ascii_case(STATE_ELEMENT) {
            if self.state.is_some() {
                return Err(self.invalid("nested <state>"));
            }
            let name = self.required(attributes, element, "name")?.to_string();
            let start = self.flag(attributes, "startstate")?;
            let mode = match xml::attribute(attributes, "mode") {
                None => StateMode::Regular,
                Some(mode) => StateMode::from_name(mode)
                    .ok_or_else(|| self.invalid(format!("unknown mode '{mode}' of state '{name}'")))?,
            };
            self.builder.add_state(name.clone(), mode, start);
            self.state = Some(name);
        } else if element.eq_ignore_ascii_case(TRANSITION_ELEMENT) {
            if self.state.is_none() || self.transition.is_some() {
                return Err(self.invalid("<transition> must be a direct child of <state>"));
            }
            let class_name = self.required(attributes, element, "event_class")?;
            let event_class = EventClass::from_name(class_name)
                .ok_or_else(|| self.invalid(format!("unknown event class '{class_name}'")))?;
            let variant = self.required(attributes, element, "event_variant")?;
            let target = self.required(attributes, element, "target")?;
            self.transition = Some(TransitionSpec::new(event_class, variant, target));
        } else if element.eq_ignore_ascii_case(CONDITION_ELEMENT) {
            let name = self.required(attributes, element, "name")?;
            let condition = if self.flag(attributes, "inverted")? {
                Condition::inverted(name)
            } else {
                Condition::new(name)
            };
            let Some(transition) = self.transition.as_mut() else {
                return Err(self.invalid("<condition> outside of <transition>"));
            };
            transition.conditions.push(condition);
        } else if element.eq_ignore_ascii_case(ACTION_ELEMENT) {
            if self.transition.is_none() || self.action.is_some() {
                return Err(self.invalid("<action> must be a direct child of <transition>"));
            }
            let name = self.required(attributes, element, "name")?;
            self.action = Some(Action::new(name));
        } else if element.eq_ignore_ascii_case(PARAMETER_ELEMENT) {
            let name = self.required(attributes, element, "name")?.to_string();
            let value = self.required(attributes, element, "value")?.to_string();
            let Some(action) = self.action.as_mut() else {
                return Err(self.invalid("<parameter> outside of <action>"));
            };
            action.parameters.set(name, value);
        } else {
            tracing::debug!(target: targets::BEHAVIOR, element, "ignoring unknown element");
        }
        Ok(())
    }

    fn end_element(&mut self, element: &str) {
        if element.eq_ignore_ascii_case(ACTION_ELEMENT) {
            if let (Some(action), Some(transition)) = (self.action.take(), self.transition.as_mut()) {
                transition.actions.push(action);
            }
        } else if element.eq_ignore_ascii_case(TRANSITION_ELEMENT) {
            if let (Some(transition), Some(state)) = (self.transition.take(), self.state.as_deref()) {
                self.builder.add_transition(state, transition);
            }
        } else if element.eq_ignore_ascii_case(STATE_ELEMENT) {
            self.state = None;
        }
    }
}
