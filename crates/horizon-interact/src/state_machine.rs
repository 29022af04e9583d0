//! The event state machine.
//!
//! An [`EventStateMachine`] runs one [`Interactor`] on a shared [`Behavior`].
//! For every event it:
//!
//! 1. asks the interactor's filter whether the event may be processed;
//! 2. maps the event to a variant name through its [`EventConfig`];
//! 3. takes the first transition of the current state whose event class is a
//!    super class of the event's class, whose variant matches, and whose
//!    conditions hold;
//! 4. runs the transition's actions in order;
//! 5. enters the target state if any action succeeded, or if there were no
//!    actions at all.
//!
//! Nothing in this sequence is an error: an event that cannot be processed
//! simply yields `false` and leaves the state unchanged.
//!
//! ```
//! use horizon_interact::actions::{ActionContext, ActionRegistry};
//! use horizon_interact::behavior::{Action, BehaviorBuilder, TransitionSpec};
//! use horizon_interact::event::{EventClass, InteractionEvent};
//! use horizon_interact::interactor::Interactor;
//! use horizon_interact::state_machine::EventStateMachine;
//! use horizon_interact_core::DataNode;
//! use std::sync::Arc;
//!
//! #[derive(Default)]
//! struct Switch {
//!     on: bool,
//! }
//!
//! impl Interactor for Switch {
//!     fn connect_actions(&self, actions: &mut ActionRegistry<Self>) {
//!         actions.add_action("TurnOn", |switch: &mut Switch, _: &ActionContext<'_>| {
//!             switch.on = true;
//!             true
//!         });
//!     }
//! }
//!
//! let behavior = BehaviorBuilder::new("Switch")
//!     .start_state("Off")
//!     .state("On")
//!     .transition(
//!         "Off",
//!         TransitionSpec::new(EventClass::InteractionKeyEvent, "StdSpace", "On")
//!             .with_action(Action::new("TurnOn")),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let mut machine = EventStateMachine::new(Switch::default());
//! machine.set_behavior(Arc::new(behavior));
//!
//! let node = DataNode::new("lamp").with_property("visible", true);
//! assert!(machine.handle_event(&InteractionEvent::key("Space"), Some(&node)));
//! assert_eq!(machine.current_state_name(), Some("On"));
//! assert!(machine.tool().on);
//! ```

use std::sync::Arc;

use horizon_interact_core::logging::targets;
use horizon_interact_core::{DataNode, PropertyList, Signal};

use crate::actions::{ActionContext, ActionRegistry, ConditionRegistry};
use crate::behavior::{Behavior, StateId, StateMode, Transition};
use crate::config::EventConfig;
use crate::error::Result;
use crate::event::InteractionEvent;
use crate::interactor::Interactor;
use crate::resource::ResourceManager;

/// Payload of [`EventStateMachine::state_changed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateChange {
    /// Name of the state that was left.
    pub from: String,
    /// Name of the state that was entered.
    pub to: String,
}

/// Drives an interactor through a behavior graph.
pub struct EventStateMachine<T: Interactor> {
    tool: T,
    behavior: Option<Arc<Behavior>>,
    current_state: Option<StateId>,
    actions: ActionRegistry<T>,
    conditions: ConditionRegistry<T>,
    config: EventConfig,
    state_changed: Signal<StateChange>,
}

impl<T: Interactor> EventStateMachine<T> {
    /// Wrap `tool`. No behavior is loaded, so every event is rejected until one is.
    pub fn new(tool: T) -> Self {
        Self {
            tool,
            behavior: None,
            current_state: None,
            actions: ActionRegistry::new(),
            conditions: ConditionRegistry::new(),
            config: EventConfig::new(),
            state_changed: Signal::new(),
        }
    }

    /// Load the behavior `file` of `module`, shared through the global
    /// behavior cache.
    ///
    /// Returns `Err` if the resource does not exist and `Ok(false)` if it is
    /// malformed; in both cases the previous behavior and handlers stay in
    /// place. On success the machine is in the start state and the
    /// interactor has registered its handlers again.
    pub fn load_state_machine(&mut self, file: &str, module: &str) -> Result<bool> {
        let loaded = Behavior::load(file, module);
        self.install(loaded, file, module)
    }

    /// Like [`load_state_machine`](Self::load_state_machine), but reads the
    /// resource from `resources` and parses it without consulting the cache.
    pub fn load_state_machine_from(
        &mut self,
        resources: &ResourceManager,
        file: &str,
        module: &str,
    ) -> Result<bool> {
        let loaded = resources
            .load_text(module, file)
            .and_then(|text| Behavior::from_xml_str(file, &text))
            .map(Arc::new);
        self.install(loaded, file, module)
    }

    fn install(&mut self, loaded: Result<Arc<Behavior>>, file: &str, module: &str) -> Result<bool> {
        match loaded {
            Ok(behavior) => {
                self.set_behavior(behavior);
                Ok(true)
            }
            Err(e) if e.is_fatal() => {
                tracing::error!(target: targets::STATE_MACHINE, module, file, error = %e, "behavior resource missing");
                Err(e)
            }
            Err(e) => {
                tracing::error!(target: targets::STATE_MACHINE, module, file, error = %e, "behavior could not be loaded");
                Ok(false)
            }
        }
    }

    /// Install `behavior`, enter its start state and let the interactor
    /// register its handlers into cleared registries.
    pub fn set_behavior(&mut self, behavior: Arc<Behavior>) {
        self.current_state = Some(behavior.start_state());
        self.actions.clear();
        self.conditions.clear();
        self.tool.connect_actions(&mut self.actions);
        self.tool.connect_conditions(&mut self.conditions);

        for name in behavior.action_names() {
            if !self.actions.contains(name) {
                tracing::debug!(target: targets::STATE_MACHINE, behavior = behavior.name(), action = name, "no handler for action");
            }
        }
        tracing::debug!(
            target: targets::STATE_MACHINE,
            behavior = behavior.name(),
            actions = self.actions.len(),
            conditions = self.conditions.len(),
            "behavior installed"
        );
        self.behavior = Some(behavior);
    }

    /// The installed behavior.
    pub fn behavior(&self) -> Option<&Arc<Behavior>> {
        self.behavior.as_ref()
    }

    /// Whether a behavior is installed.
    pub fn is_loaded(&self) -> bool {
        self.behavior.is_some()
    }

    /// Replace the event configuration with the resource `file` of `module`.
    pub fn load_event_config(&mut self, file: &str, module: &str) -> Result<bool> {
        self.load_event_config_from(ResourceManager::global(), file, module)
    }

    /// [`load_event_config`](Self::load_event_config) with an explicit resource manager.
    pub fn load_event_config_from(
        &mut self,
        resources: &ResourceManager,
        file: &str,
        module: &str,
    ) -> Result<bool> {
        let ok = self.config.load_config_from(resources, file, module)?;
        self.tool.configuration_changed(self.config.attributes());
        Ok(ok)
    }

    /// Merge the resource `file` of `module` into the event configuration.
    pub fn add_event_config(&mut self, file: &str, module: &str) -> Result<bool> {
        self.add_event_config_from(ResourceManager::global(), file, module)
    }

    /// [`add_event_config`](Self::add_event_config) with an explicit resource manager.
    pub fn add_event_config_from(
        &mut self,
        resources: &ResourceManager,
        file: &str,
        module: &str,
    ) -> Result<bool> {
        let ok = self.config.add_config_from(resources, file, module)?;
        self.tool.configuration_changed(self.config.attributes());
        Ok(ok)
    }

    /// Replace the event configuration.
    pub fn set_event_config(&mut self, config: EventConfig) {
        self.config = config;
        self.tool.configuration_changed(self.config.attributes());
    }

    /// The event configuration.
    pub fn event_config(&self) -> &EventConfig {
        &self.config
    }

    /// Register an action handler, replacing any handler of the same name.
    pub fn add_action_function<F>(&mut self, name: impl Into<String>, action: F) -> bool
    where
        F: FnMut(&mut T, &ActionContext<'_>) -> bool + 'static,
    {
        self.actions.add_action(name, action)
    }

    /// Register a condition predicate, replacing any predicate of the same name.
    pub fn add_condition_function<F>(&mut self, name: impl Into<String>, condition: F) -> bool
    where
        F: Fn(&T, &ActionContext<'_>) -> bool + 'static,
    {
        self.conditions.add_condition(name, condition)
    }

    /// The registered action handlers.
    pub fn actions(&self) -> &ActionRegistry<T> {
        &self.actions
    }

    /// The registered condition predicates.
    pub fn conditions(&self) -> &ConditionRegistry<T> {
        &self.conditions
    }

    /// The current state, `None` while no behavior is installed.
    pub fn current_state(&self) -> Option<StateId> {
        self.current_state
    }

    /// Name of the current state.
    pub fn current_state_name(&self) -> Option<&str> {
        let behavior = self.behavior.as_ref()?;
        behavior.state(self.current_state?).map(|state| state.name())
    }

    /// Dispatch mode requested by the current state.
    pub fn current_mode(&self) -> StateMode {
        self.behavior
            .as_ref()
            .zip(self.current_state)
            .and_then(|(behavior, id)| behavior.state(id))
            .map(|state| state.mode())
            .unwrap_or_default()
    }

    /// Go back to the start state of the installed behavior.
    pub fn reset_to_start_state(&mut self) {
        if let Some(behavior) = &self.behavior {
            self.current_state = Some(behavior.start_state());
        }
    }

    /// Notified after every transition into a different state.
    pub fn state_changed(&self) -> &Signal<StateChange> {
        &self.state_changed
    }

    /// The interactor.
    pub fn tool(&self) -> &T {
        &self.tool
    }

    /// The interactor, mutably.
    pub fn tool_mut(&mut self) -> &mut T {
        &mut self.tool
    }

    /// Drain the internal signals the interactor raised.
    pub fn take_internal_signals(&mut self) -> Vec<String> {
        self.tool.take_internal_signals()
    }

    /// Process one event for `node`. Returns whether the event was handled.
    #[tracing::instrument(
        skip_all,
        target = "horizon_interact::state_machine",
        level = "trace",
        fields(class = %event.class())
    )]
    pub fn handle_event(&mut self, event: &InteractionEvent, node: Option<&DataNode>) -> bool {
        if !self.tool.filter_event(event, node) {
            tracing::trace!(target: targets::STATE_MACHINE, "event filtered out");
            return false;
        }

        let (Some(behavior), Some(current)) = (self.behavior.clone(), self.current_state) else {
            tracing::trace!(target: targets::STATE_MACHINE, "no behavior loaded");
            return false;
        };

        let Some(variant) = self.config.mapped_event(event) else {
            tracing::trace!(target: targets::STATE_MACHINE, "event has no variant");
            return false;
        };

        let Some(transition) = behavior
            .candidate_transitions(current, event.class(), &variant)
            .find(|transition| conditions_hold(&self.conditions, &self.tool, transition, event, node))
        else {
            tracing::trace!(target: targets::STATE_MACHINE, variant = %variant, "no applicable transition");
            return false;
        };

        let mut succeeded = false;
        let mut failed = Vec::new();
        for action in transition.actions() {
            let ctx = ActionContext::new(action.name(), action.parameters(), event, node);
            match self.actions.execute(action.name(), &mut self.tool, &ctx) {
                Some(true) => succeeded = true,
                Some(false) => failed.push(action.name()),
                None => {
                    tracing::warn!(target: targets::STATE_MACHINE, action = action.name(), "no handler registered for action");
                    failed.push(action.name());
                }
            }
        }

        if !(succeeded || transition.actions().is_empty()) {
            tracing::debug!(target: targets::STATE_MACHINE, failed = ?failed, "all actions failed, keeping state");
            return false;
        }
        if !failed.is_empty() {
            tracing::debug!(target: targets::STATE_MACHINE, failed = ?failed, "transition taken despite failed actions");
        }

        let target = transition.target();
        self.current_state = Some(target);
        if target != current {
            let name = |id| behavior.state(id).map(|state| state.name().to_string()).unwrap_or_default();
            let change = StateChange {
                from: name(current),
                to: name(target),
            };
            tracing::debug!(target: targets::STATE_MACHINE, from = %change.from, to = %change.to, "state changed");
            self.state_changed.emit(change);
        }
        true
    }
}

fn conditions_hold<T: Interactor>(
    conditions: &ConditionRegistry<T>,
    tool: &T,
    transition: &Transition,
    event: &InteractionEvent,
    node: Option<&DataNode>,
) -> bool {
    let no_parameters = PropertyList::new();
    transition.conditions().iter().all(|condition| {
        let ctx = ActionContext::new(condition.name(), &no_parameters, event, node);
        match conditions.check(condition.name(), tool, &ctx) {
            Some(holds) => holds != condition.is_inverted(),
            None => {
                tracing::warn!(target: targets::STATE_MACHINE, condition = condition.name(), "no predicate registered for condition");
                false
            }
        }
    })
}

impl<T: Interactor + std::fmt::Debug> std::fmt::Debug for EventStateMachine<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStateMachine")
            .field("tool", &self.tool)
            .field("behavior", &self.behavior.as_ref().map(|b| b.name()))
            .field("current_state", &self.current_state_name())
            .finish()
    }
}
