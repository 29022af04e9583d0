//! Behavior graphs: the states, transitions and actions of one tool.
//!
//! A [`Behavior`] is immutable once built and is shared through `Arc` by every
//! state machine running the same tool; each state machine only keeps the
//! [`StateId`] of its current state.
//!
//! Behaviors are usually loaded from XML resources (see [`Behavior::load`]),
//! but can also be assembled in code:
//!
//! ```
//! use horizon_interact::behavior::{Action, BehaviorBuilder, TransitionSpec};
//! use horizon_interact::event::EventClass;
//!
//! let behavior = BehaviorBuilder::new("Toggle")
//!     .start_state("Idle")
//!     .state("Active")
//!     .transition(
//!         "Idle",
//!         TransitionSpec::new(EventClass::MousePressEvent, "StdClick", "Active")
//!             .with_action(Action::new("Activate")),
//!     )
//!     .transition(
//!         "Active",
//!         TransitionSpec::new(EventClass::MousePressEvent, "StdClick", "Idle"),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let idle = behavior.start_state();
//! assert_eq!(behavior.state(idle).unwrap().name(), "Idle");
//! assert_eq!(behavior.state(idle).unwrap().transitions().len(), 1);
//! ```

mod cache;
mod loader;

pub use cache::BehaviorCache;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use horizon_interact_core::PropertyList;

use crate::error::{Error, Result};
use crate::event::EventClass;
use crate::resource::ResourceManager;

/// Index of a state inside its [`Behavior`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateId(usize);

impl StateId {
    /// The position of the state in declaration order.
    pub fn index(self) -> usize {
        self.0
    }
}

/// How a state wants the dispatcher to route events while it is current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StateMode {
    /// Events go to interactors in the usual order.
    #[default]
    Regular,
    /// Only this interactor receives events.
    GrabInput,
    /// This interactor is asked first.
    PreferInput,
}

impl StateMode {
    /// The mode name used in behavior documents.
    pub fn name(self) -> &'static str {
        match self {
            Self::Regular => "REGULAR",
            Self::GrabInput => "GRAB_INPUT",
            Self::PreferInput => "PREFER_INPUT",
        }
    }

    /// Parse a mode name, ignoring ASCII case.
    pub fn from_name(name: &str) -> Option<Self> {
        [Self::Regular, Self::GrabInput, Self::PreferInput]
            .into_iter()
            .find(|mode| mode.name().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for StateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A named operation executed during a transition.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Action {
    name: String,
    parameters: PropertyList,
}

impl Action {
    /// An action without parameters.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: PropertyList::new(),
        }
    }

    /// Builder-style parameter setter.
    pub fn with_parameter(mut self, name: &str, value: &str) -> Self {
        self.parameters.set(name, value);
        self
    }

    /// The action name handlers are registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameters given in the behavior document.
    pub fn parameters(&self) -> &PropertyList {
        &self.parameters
    }
}

/// A guard that must hold for a transition to be taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    name: String,
    inverted: bool,
}

impl Condition {
    /// A condition that must be true.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inverted: false,
        }
    }

    /// A condition that must be false.
    pub fn inverted(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inverted: true,
        }
    }

    /// The name condition handlers are registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the handler's result is negated.
    pub fn is_inverted(&self) -> bool {
        self.inverted
    }
}

/// An edge of the behavior graph.
#[derive(Debug, Clone)]
pub struct Transition {
    event_class: EventClass,
    event_variant: String,
    target: StateId,
    conditions: Vec<Condition>,
    actions: Vec<Action>,
}

impl Transition {
    /// The event class this transition reacts to, including subclasses.
    pub fn event_class(&self) -> EventClass {
        self.event_class
    }

    /// The event variant this transition reacts to.
    pub fn event_variant(&self) -> &str {
        &self.event_variant
    }

    /// The state entered when the transition succeeds.
    pub fn target(&self) -> StateId {
        self.target
    }

    /// Guards, all of which must hold.
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Actions in execution order.
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Whether this transition applies to an event of `class` mapped to `variant`.
    pub fn handles(&self, class: EventClass, variant: &str) -> bool {
        self.event_class.is_super_class_of(class) && self.event_variant == variant
    }
}

/// A node of the behavior graph.
#[derive(Debug, Clone)]
pub struct State {
    name: String,
    mode: StateMode,
    transitions: Vec<Transition>,
}

impl State {
    /// The state name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The dispatch mode requested while this state is current.
    pub fn mode(&self) -> StateMode {
        self.mode
    }

    /// Outgoing transitions in declaration order.
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }
}

/// An immutable state graph with one start state.
#[derive(Debug, Clone)]
pub struct Behavior {
    name: String,
    states: Vec<State>,
    start: StateId,
}

impl Behavior {
    /// Load the behavior `file` of `module` through the global cache and
    /// resource manager.
    ///
    /// Fails with [`Error::ResourceNotFound`] if the resource does not exist;
    /// any other error means the resource is malformed.
    pub fn load(file: &str, module: &str) -> Result<Arc<Behavior>> {
        BehaviorCache::global().get_or_load(ResourceManager::global(), file, module)
    }

    /// Parse a behavior document. `name` is used when the document does not
    /// name the state machine itself.
    pub fn from_xml_str(name: &str, text: &str) -> Result<Behavior> {
        loader::parse_behavior(name, text)
    }

    /// The behavior's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The designated start state.
    pub fn start_state(&self) -> StateId {
        self.start
    }

    /// Look up a state.
    pub fn state(&self, id: StateId) -> Option<&State> {
        self.states.get(id.0)
    }

    /// Find a state by name.
    pub fn state_by_name(&self, name: &str) -> Option<StateId> {
        self.states
            .iter()
            .position(|state| state.name == name)
            .map(StateId)
    }

    /// All states with their IDs, in declaration order.
    pub fn states(&self) -> impl Iterator<Item = (StateId, &State)> {
        self.states
            .iter()
            .enumerate()
            .map(|(index, state)| (StateId(index), state))
    }

    /// Number of states.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Always `false`: a behavior has at least its start state.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Transitions of `state` applicable to an event of `class` mapped to
    /// `variant`, in declaration order.
    pub fn candidate_transitions<'a>(
        &'a self,
        state: StateId,
        class: EventClass,
        variant: &'a str,
    ) -> impl Iterator<Item = &'a Transition> + 'a {
        self.state(state)
            .map(|state| state.transitions.as_slice())
            .unwrap_or_default()
            .iter()
            .filter(move |transition| transition.handles(class, variant))
    }

    /// Names of every action referenced by any transition, sorted.
    pub fn action_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .states
            .iter()
            .flat_map(|state| &state.transitions)
            .flat_map(|transition| &transition.actions)
            .map(Action::name)
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}

/// A transition under construction, addressed by target state name.
#[derive(Debug, Clone)]
pub struct TransitionSpec {
    event_class: EventClass,
    event_variant: String,
    target: String,
    conditions: Vec<Condition>,
    actions: Vec<Action>,
}

impl TransitionSpec {
    /// A transition to `target` on events of `event_class` mapped to `event_variant`.
    pub fn new(
        event_class: EventClass,
        event_variant: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            event_class,
            event_variant: event_variant.into(),
            target: target.into(),
            conditions: Vec::new(),
            actions: Vec::new(),
        }
    }

    /// Append an action.
    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    /// Append a guard condition.
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }
}

#[derive(Debug)]
struct StateSpec {
    name: String,
    mode: StateMode,
    start: bool,
    transitions: Vec<TransitionSpec>,
}

/// Assembles and validates a [`Behavior`].
#[derive(Debug)]
pub struct BehaviorBuilder {
    name: String,
    states: Vec<StateSpec>,
    orphans: Vec<String>,
}

impl BehaviorBuilder {
    /// Start a behavior called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            states: Vec::new(),
            orphans: Vec::new(),
        }
    }

    /// The behavior name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the behavior.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Add a regular state.
    pub fn state(self, name: impl Into<String>) -> Self {
        self.state_with_mode(name, StateMode::Regular, false)
    }

    /// Add the regular start state.
    pub fn start_state(self, name: impl Into<String>) -> Self {
        self.state_with_mode(name, StateMode::Regular, true)
    }

    /// Add a state with an explicit mode.
    pub fn state_with_mode(mut self, name: impl Into<String>, mode: StateMode, start: bool) -> Self {
        self.add_state(name, mode, start);
        self
    }

    /// Add an outgoing transition to the state named `from`.
    pub fn transition(mut self, from: &str, transition: TransitionSpec) -> Self {
        self.add_transition(from, transition);
        self
    }

    pub(crate) fn add_state(&mut self, name: impl Into<String>, mode: StateMode, start: bool) {
        self.states.push(StateSpec {
            name: name.into(),
            mode,
            start,
            transitions: Vec::new(),
        });
    }

    pub(crate) fn add_transition(&mut self, from: &str, transition: TransitionSpec) {
        // The last state of that name, so validation reports duplicates
        // rather than misplacing transitions.
        match self.states.iter_mut().rev().find(|state| state.name == from) {
            Some(state) => state.transitions.push(transition),
            None => self.orphans.push(from.to_string()),
        }
    }

    /// Validate and build the graph.
    ///
    /// Requires at least one state, exactly one start state, unique state
    /// names, and an existing target for every transition.
    pub fn build(self) -> Result<Behavior> {
        let invalid = |message: String| Error::invalid_behavior(&self.name, message);

        if let Some(from) = self.orphans.first() {
            return Err(invalid(format!("transition from unknown state '{from}'")));
        }
        if self.states.is_empty() {
            return Err(invalid("no states defined".to_string()));
        }

        let mut ids = HashMap::with_capacity(self.states.len());
        for (index, state) in self.states.iter().enumerate() {
            if ids.insert(state.name.as_str(), StateId(index)).is_some() {
                return Err(invalid(format!("duplicate state '{}'", state.name)));
            }
        }

        let starts: Vec<StateId> = self
            .states
            .iter()
            .enumerate()
            .filter(|(_, state)| state.start)
            .map(|(index, _)| StateId(index))
            .collect();
        let start = match starts.as_slice() {
            [start] => *start,
            [] => return Err(invalid("no start state".to_string())),
            _ => return Err(invalid(format!("{} start states", starts.len()))),
        };

        let mut states = Vec::with_capacity(self.states.len());
        for spec in &self.states {
            let mut transitions = Vec::with_capacity(spec.transitions.len());
            for transition in &spec.transitions {
                let target = ids.get(transition.target.as_str()).copied().ok_or_else(|| {
                    invalid(format!(
                        "transition from '{}' targets unknown state '{}'",
                        spec.name, transition.target
                    ))
                })?;
                transitions.push(Transition {
                    event_class: transition.event_class,
                    event_variant: transition.event_variant.clone(),
                    target,
                    conditions: transition.conditions.clone(),
                    actions: transition.actions.clone(),
                });
            }
            states.push(State {
                name: spec.name.clone(),
                mode: spec.mode,
                transitions,
            });
        }

        Ok(Behavior {
            name: self.name.clone(),
            states,
            start,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toggle() -> BehaviorBuilder {
        BehaviorBuilder::new("Toggle")
            .start_state("Idle")
            .state("Active")
            .transition(
                "Idle",
                TransitionSpec::new(EventClass::InteractionPositionEvent, "StdClick", "Active")
                    .with_action(Action::new("Activate").with_parameter("speed", "2")),
            )
            .transition(
                "Idle",
                TransitionSpec::new(EventClass::MousePressEvent, "StdClick", "Idle"),
            )
    }

    #[test]
    fn test_build_and_lookup() {
        let behavior = toggle().build().unwrap();
        assert_eq!(behavior.name(), "Toggle");
        assert_eq!(behavior.len(), 2);

        let idle = behavior.start_state();
        let active = behavior.state_by_name("Active").unwrap();
        assert_eq!(active.index(), 1);

        let candidates: Vec<_> = behavior
            .candidate_transitions(idle, EventClass::MousePressEvent, "StdClick")
            .map(Transition::target)
            .collect();
        assert_eq!(candidates, vec![active, idle]);

        let candidates: Vec<_> = behavior
            .candidate_transitions(idle, EventClass::MouseWheelEvent, "StdClick")
            .collect();
        assert_eq!(candidates.len(), 1);

        assert_eq!(
            behavior
                .candidate_transitions(idle, EventClass::InteractionKeyEvent, "StdClick")
                .count(),
            0
        );
        assert_eq!(
            behavior
                .candidate_transitions(active, EventClass::MousePressEvent, "StdClick")
                .count(),
            0
        );
        assert_eq!(behavior.action_names(), vec!["Activate"]);
    }

    #[test]
    fn test_validation() {
        let err = BehaviorBuilder::new("Empty").build().unwrap_err();
        assert!(matches!(err, Error::InvalidBehavior { .. }));

        assert!(BehaviorBuilder::new("NoStart").state("A").build().is_err());
        assert!(
            BehaviorBuilder::new("TwoStarts")
                .start_state("A")
                .start_state("B")
                .build()
                .is_err()
        );
        assert!(
            BehaviorBuilder::new("Duplicate")
                .start_state("A")
                .state("A")
                .build()
                .is_err()
        );
        assert!(
            toggle()
                .transition(
                    "Active",
                    TransitionSpec::new(EventClass::MouseMoveEvent, "Move", "Nowhere")
                )
                .build()
                .is_err()
        );
        assert!(
            toggle()
                .transition(
                    "Missing",
                    TransitionSpec::new(EventClass::MouseMoveEvent, "Move", "Idle")
                )
                .build()
                .is_err()
        );
    }

    #[test]
    fn test_state_mode_names() {
        assert_eq!(StateMode::from_name("grab_input"), Some(StateMode::GrabInput));
        assert_eq!(StateMode::from_name("PREFER_INPUT"), Some(StateMode::PreferInput));
        assert_eq!(StateMode::from_name("exclusive"), None);
        assert_eq!(StateMode::default().to_string(), "REGULAR");
    }
}
