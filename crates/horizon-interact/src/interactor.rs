//! The capability a tool implements to run on an [`EventStateMachine`].
//!
//! [`EventStateMachine`]: crate::state_machine::EventStateMachine

use horizon_interact_core::logging::targets;
use horizon_interact_core::{CoreError, DataNode, PropertyList, VISIBLE_PROPERTY};

use crate::actions::{ActionRegistry, ConditionRegistry};
use crate::event::InteractionEvent;

/// Tool logic driven by a behavior graph.
///
/// The state machine calls [`connect_actions`](Self::connect_actions) and
/// [`connect_conditions`](Self::connect_conditions) after every successful
/// behavior load, with freshly cleared registries.
pub trait Interactor {
    /// Bind the action names of the behavior to handlers.
    fn connect_actions(&self, actions: &mut ActionRegistry<Self>);

    /// Bind guard condition names to predicates.
    fn connect_conditions(&self, _conditions: &mut ConditionRegistry<Self>) {}

    /// Decide whether an event may reach the state machine at all.
    ///
    /// Defaults to [`default_event_filter`].
    fn filter_event(&self, event: &InteractionEvent, node: Option<&DataNode>) -> bool {
        default_event_filter(event, node)
    }

    /// Called after the event configuration was loaded or replaced, with its
    /// free-form parameters.
    fn configuration_changed(&mut self, _parameters: &PropertyList) {}

    /// Drain the internal signals raised by actions since the last call.
    ///
    /// The dispatcher turns each into an internal event addressed to this
    /// interactor. Raising a signal for every internal event handled forms a
    /// loop that the dispatcher cuts off after
    /// [`MAX_QUEUED_EVENTS`](crate::dispatcher::MAX_QUEUED_EVENTS).
    fn take_internal_signals(&mut self) -> Vec<String> {
        Vec::new()
    }
}

/// Accept an event only if the node exists and carries a boolean `"visible"`
/// property that is `true`.
///
/// A missing or non-boolean property rejects the event.
pub fn default_event_filter(event: &InteractionEvent, node: Option<&DataNode>) -> bool {
    let Some(node) = node else {
        tracing::debug!(target: targets::STATE_MACHINE, class = %event.class(), "rejecting event without data node");
        return false;
    };
    match node.bool_property(VISIBLE_PROPERTY) {
        Ok(visible) => visible,
        Err(CoreError::PropertyNotFound(_)) => {
            tracing::trace!(target: targets::STATE_MACHINE, node = node.name(), "node has no visible property");
            false
        }
        Err(e) => {
            tracing::trace!(target: targets::STATE_MACHINE, node = node.name(), error = %e, "rejecting event");
            false
        }
    }
}
