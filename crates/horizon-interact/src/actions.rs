//! Action and condition registries.
//!
//! A state machine resolves the action names of a transition through its
//! [`ActionRegistry`], and guard conditions through its [`ConditionRegistry`].
//! Both registries exclusively own their handlers: registering a name again
//! drops the previous handler, and reloading a behavior clears the registry
//! before the interactor registers its handlers anew.
//!
//! Handlers receive the interactor mutably plus an [`ActionContext`]:
//!
//! ```
//! use horizon_interact::actions::{ActionContext, ActionRegistry};
//! use horizon_interact::event::InteractionEvent;
//! use horizon_interact_core::PropertyList;
//!
//! #[derive(Default)]
//! struct Counter {
//!     clicks: u32,
//! }
//!
//! let mut actions = ActionRegistry::<Counter>::new();
//! actions.add_action("Count", |counter: &mut Counter, _ctx: &ActionContext<'_>| {
//!     counter.clicks += 1;
//!     true
//! });
//!
//! let mut counter = Counter::default();
//! let event = InteractionEvent::key("A");
//! let parameters = PropertyList::new();
//! let ctx = ActionContext::new("Count", &parameters, &event, None);
//!
//! assert_eq!(actions.execute("Count", &mut counter, &ctx), Some(true));
//! assert_eq!(actions.execute("Missing", &mut counter, &ctx), None);
//! assert_eq!(counter.clicks, 1);
//! ```

use std::collections::HashMap;

use horizon_interact_core::{DataNode, PropertyList};

use crate::event::InteractionEvent;

/// What an action or condition handler gets to see.
#[derive(Debug, Clone, Copy)]
pub struct ActionContext<'a> {
    name: &'a str,
    parameters: &'a PropertyList,
    event: &'a InteractionEvent,
    node: Option<&'a DataNode>,
}

impl<'a> ActionContext<'a> {
    /// Bundle the arguments of one handler invocation.
    pub fn new(
        name: &'a str,
        parameters: &'a PropertyList,
        event: &'a InteractionEvent,
        node: Option<&'a DataNode>,
    ) -> Self {
        Self {
            name,
            parameters,
            event,
            node,
        }
    }

    /// The action or condition name being executed.
    pub fn name(&self) -> &'a str {
        self.name
    }

    /// Parameters declared on the action in the behavior document.
    pub fn parameters(&self) -> &'a PropertyList {
        self.parameters
    }

    /// The event that triggered the transition.
    pub fn event(&self) -> &'a InteractionEvent {
        self.event
    }

    /// The data node the interactor works on, if any.
    pub fn node(&self) -> Option<&'a DataNode> {
        self.node
    }
}

/// An executable action bound to an interactor type.
///
/// Implemented for every `FnMut(&mut T, &ActionContext) -> bool`; implement it
/// directly for handlers that carry their own state.
pub trait ActionHandler<T: ?Sized> {
    /// Run the action. Returns whether it succeeded.
    fn execute(&mut self, tool: &mut T, ctx: &ActionContext<'_>) -> bool;
}

impl<T: ?Sized, F> ActionHandler<T> for F
where
    F: FnMut(&mut T, &ActionContext<'_>) -> bool,
{
    fn execute(&mut self, tool: &mut T, ctx: &ActionContext<'_>) -> bool {
        self(tool, ctx)
    }
}

/// Action name to handler table.
pub struct ActionRegistry<T: ?Sized> {
    handlers: HashMap<String, Box<dyn ActionHandler<T>>>,
}

impl<T: ?Sized> Default for ActionRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> ActionRegistry<T> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a closure for `name`. Returns `true` if a previous handler was replaced.
    pub fn add_action<F>(&mut self, name: impl Into<String>, action: F) -> bool
    where
        F: FnMut(&mut T, &ActionContext<'_>) -> bool + 'static,
    {
        self.add_handler(name, Box::new(action))
    }

    /// Register a handler object for `name`. Returns `true` if a previous handler was replaced.
    pub fn add_handler(&mut self, name: impl Into<String>, handler: Box<dyn ActionHandler<T>>) -> bool {
        self.handlers.insert(name.into(), handler).is_some()
    }

    /// Remove the handler for `name`.
    pub fn remove(&mut self, name: &str) -> bool {
        self.handlers.remove(name).is_some()
    }

    /// Whether a handler is registered for `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no handler is registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Drop every handler.
    pub fn clear(&mut self) {
        self.handlers.clear();
    }

    /// Run the handler for `name`. Returns `None` if none is registered.
    pub fn execute(&mut self, name: &str, tool: &mut T, ctx: &ActionContext<'_>) -> Option<bool> {
        self.handlers
            .get_mut(name)
            .map(|handler| handler.execute(tool, ctx))
    }
}

impl<T: ?Sized> std::fmt::Debug for ActionRegistry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("names", &self.names())
            .finish()
    }
}

type ConditionFn<T> = Box<dyn Fn(&T, &ActionContext<'_>) -> bool>;

/// Condition name to predicate table.
pub struct ConditionRegistry<T: ?Sized> {
    conditions: HashMap<String, ConditionFn<T>>,
}

impl<T: ?Sized> Default for ConditionRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> ConditionRegistry<T> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            conditions: HashMap::new(),
        }
    }

    /// Register a predicate for `name`. Returns `true` if a previous one was replaced.
    pub fn add_condition<F>(&mut self, name: impl Into<String>, condition: F) -> bool
    where
        F: Fn(&T, &ActionContext<'_>) -> bool + 'static,
    {
        self.conditions
            .insert(name.into(), Box::new(condition))
            .is_some()
    }

    /// Remove the predicate for `name`.
    pub fn remove(&mut self, name: &str) -> bool {
        self.conditions.remove(name).is_some()
    }

    /// Whether a predicate is registered for `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.conditions.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.conditions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered predicates.
    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    /// Whether no predicate is registered.
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Drop every predicate.
    pub fn clear(&mut self) {
        self.conditions.clear();
    }

    /// Evaluate the predicate for `name`. Returns `None` if none is registered.
    pub fn check(&self, name: &str, tool: &T, ctx: &ActionContext<'_>) -> Option<bool> {
        self.conditions.get(name).map(|condition| condition(tool, ctx))
    }
}

impl<T: ?Sized> std::fmt::Debug for ConditionRegistry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConditionRegistry")
            .field("names", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[derive(Default)]
    struct Tool {
        log: Vec<String>,
        armed: bool,
    }

    struct Recorder {
        calls: usize,
    }

    impl ActionHandler<Tool> for Recorder {
        fn execute(&mut self, tool: &mut Tool, ctx: &ActionContext<'_>) -> bool {
            self.calls += 1;
            tool.log.push(format!("{}#{}", ctx.name(), self.calls));
            true
        }
    }

    fn with_ctx<R>(name: &str, f: impl FnOnce(&ActionContext<'_>) -> R) -> R {
        let event = InteractionEvent::key("A");
        let parameters: PropertyList = [("step", 2)].into_iter().collect();
        f(&ActionContext::new(name, &parameters, &event, None))
    }

    #[test]
    fn test_handler_objects_keep_state() {
        let mut actions = ActionRegistry::<Tool>::new();
        actions.add_handler("Record", Box::new(Recorder { calls: 0 }));

        let mut tool = Tool::default();
        with_ctx("Record", |ctx| {
            assert_eq!(actions.execute("Record", &mut tool, ctx), Some(true));
            assert_eq!(actions.execute("Record", &mut tool, ctx), Some(true));
        });
        assert_eq!(tool.log, vec!["Record#1", "Record#2"]);
    }

    #[test]
    fn test_replacing_drops_previous_handler() {
        let token = Rc::new(());
        let mut actions = ActionRegistry::<Tool>::new();

        let held = token.clone();
        assert!(!actions.add_action("Act", move |_: &mut Tool, _: &ActionContext<'_>| {
            let _ = &held;
            true
        }));
        assert_eq!(Rc::strong_count(&token), 2);

        assert!(actions.add_action("Act", |_: &mut Tool, _: &ActionContext<'_>| false));
        assert_eq!(Rc::strong_count(&token), 1);

        let mut tool = Tool::default();
        with_ctx("Act", |ctx| {
            assert_eq!(actions.execute("Act", &mut tool, ctx), Some(false));
        });

        assert!(actions.remove("Act"));
        assert!(!actions.contains("Act"));
        assert!(actions.is_empty());
    }

    #[test]
    fn test_parameters_reach_handlers() {
        let mut actions = ActionRegistry::<Tool>::new();
        actions.add_action("Step", |tool: &mut Tool, ctx: &ActionContext<'_>| {
            let step = ctx.parameters().get_int("step").unwrap_or(1);
            tool.log.push(format!("step {step}"));
            ctx.event().key_name() == Some("A")
        });
        actions.add_action("Other", |_: &mut Tool, _: &ActionContext<'_>| true);
        assert_eq!(actions.names(), vec!["Other", "Step"]);

        let mut tool = Tool::default();
        with_ctx("Step", |ctx| {
            assert_eq!(actions.execute("Step", &mut tool, ctx), Some(true));
        });
        assert_eq!(tool.log, vec!["step 2"]);

        actions.clear();
        assert_eq!(actions.len(), 0);
    }

    #[test]
    fn test_conditions() {
        let mut conditions = ConditionRegistry::<Tool>::new();
        conditions.add_condition("IsArmed", |tool: &Tool, _: &ActionContext<'_>| tool.armed);

        let mut tool = Tool::default();
        with_ctx("IsArmed", |ctx| {
            assert_eq!(conditions.check("IsArmed", &tool, ctx), Some(false));
            tool.armed = true;
            assert_eq!(conditions.check("IsArmed", &tool, ctx), Some(true));
            assert_eq!(conditions.check("Unknown", &tool, ctx), None);
        });
        assert_eq!(conditions.names(), vec!["IsArmed"]);
    }
}
