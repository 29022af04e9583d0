//! Routing events to many interactors.
//!
//! The [`Dispatcher`] owns every registered interactor together with the data
//! node it works on and decides who gets to see an event:
//!
//! - **Regular**: interactors are asked in order of their node's `"layer"`
//!   property (highest first, ties in registration order) until one handles
//!   the event.
//! - **Connected mouse action**: after an interactor handled a mouse press, it
//!   is asked first for every event until a mouse release was processed.
//! - **Grab input**: while the handling interactor's current state has mode
//!   `GRAB_INPUT`, only that interactor receives events.
//! - **Prefer input**: while its current state has mode `PREFER_INPUT`, that
//!   interactor is asked first.
//!
//! Internal events that name a target go straight to that interactor. Signals
//! raised by an interactor are queued as internal events addressed to it and
//! processed after the current event, in order. At most
//! [`MAX_QUEUED_EVENTS`] are processed per call; the rest are dropped with a
//! warning, so an interactor that answers every internal event with a new
//! signal cannot stall the dispatcher.

use std::collections::VecDeque;
use std::sync::Arc;

use horizon_interact_core::logging::targets;
use horizon_interact_core::{DataNode, Signal};
use slotmap::{SlotMap, new_key_type};

use crate::behavior::StateMode;
use crate::event::{EventClass, InteractionEvent};
use crate::interactor::Interactor;
use crate::state_machine::EventStateMachine;

/// Queued events processed per [`Dispatcher::process_event`] call.
pub const MAX_QUEUED_EVENTS: usize = 256;

new_key_type! {
    /// Identifies an interactor registered with a [`Dispatcher`].
    pub struct InteractorId;
}

/// An interactor as seen by the dispatcher.
pub trait DataInteractor {
    /// Process one event. Returns whether it was handled.
    fn handle_event(&mut self, event: &InteractionEvent, node: Option<&DataNode>) -> bool;

    /// The mode requested by the current state.
    fn mode(&self) -> StateMode;

    /// Drain internal signals raised since the last call.
    fn take_internal_signals(&mut self) -> Vec<String>;

    /// Return to the start state.
    fn reset(&mut self);

    /// A name for diagnostics.
    fn name(&self) -> &str;
}

impl<T: Interactor> DataInteractor for EventStateMachine<T> {
    fn handle_event(&mut self, event: &InteractionEvent, node: Option<&DataNode>) -> bool {
        EventStateMachine::handle_event(self, event, node)
    }

    fn mode(&self) -> StateMode {
        self.current_mode()
    }

    fn take_internal_signals(&mut self) -> Vec<String> {
        EventStateMachine::take_internal_signals(self)
    }

    fn reset(&mut self) {
        self.reset_to_start_state();
    }

    fn name(&self) -> &str {
        self.behavior()
            .map(|behavior| behavior.name())
            .unwrap_or("<unloaded>")
    }
}

/// How the dispatcher currently routes events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessingMode {
    /// Interactors are asked in layer order.
    #[default]
    Regular,
    /// The interactor that handled a mouse press is asked first until release.
    ConnectedMouseAction,
    /// Only the selected interactor receives events.
    GrabInput,
    /// The selected interactor is asked first.
    PreferInput,
}

struct Entry {
    interactor: Box<dyn DataInteractor>,
    node: Option<Arc<DataNode>>,
    sequence: u64,
}

/// Owns interactors and routes events between them.
#[derive(Default)]
pub struct Dispatcher {
    interactors: SlotMap<InteractorId, Entry>,
    next_sequence: u64,
    mode: ProcessingMode,
    selected: Option<InteractorId>,
    queue: VecDeque<InteractionEvent>,
    event_processed: Signal<(InteractionEvent, bool)>,
}

impl Dispatcher {
    /// Create a dispatcher without interactors.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an interactor working on `node`.
    pub fn add_interactor(
        &mut self,
        interactor: Box<dyn DataInteractor>,
        node: Option<Arc<DataNode>>,
    ) -> InteractorId {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        let name = interactor.name().to_string();
        let id = self.interactors.insert(Entry {
            interactor,
            node,
            sequence,
        });
        tracing::debug!(target: targets::DISPATCHER, ?id, interactor = %name, "registered interactor");
        id
    }

    /// Register a state machine working on `node`.
    pub fn add<T: Interactor + 'static>(
        &mut self,
        machine: EventStateMachine<T>,
        node: Option<Arc<DataNode>>,
    ) -> InteractorId {
        self.add_interactor(Box::new(machine), node)
    }

    /// Unregister an interactor. If it was selected, the dispatcher returns to
    /// regular processing.
    pub fn remove_interactor(&mut self, id: InteractorId) -> Option<Box<dyn DataInteractor>> {
        let entry = self.interactors.remove(id)?;
        if self.selected == Some(id) {
            self.set_mode(ProcessingMode::Regular, None);
        }
        tracing::debug!(target: targets::DISPATCHER, ?id, "removed interactor");
        Some(entry.interactor)
    }

    /// Whether `id` is registered.
    pub fn contains(&self, id: InteractorId) -> bool {
        self.interactors.contains_key(id)
    }

    /// Number of registered interactors.
    pub fn len(&self) -> usize {
        self.interactors.len()
    }

    /// Whether no interactor is registered.
    pub fn is_empty(&self) -> bool {
        self.interactors.is_empty()
    }

    /// Access a registered interactor.
    pub fn interactor(&self, id: InteractorId) -> Option<&dyn DataInteractor> {
        self.interactors.get(id).map(|entry| entry.interactor.as_ref())
    }

    /// Access a registered interactor mutably.
    pub fn interactor_mut(&mut self, id: InteractorId) -> Option<&mut (dyn DataInteractor + 'static)> {
        self.interactors
            .get_mut(id)
            .map(|entry| entry.interactor.as_mut())
    }

    /// The node an interactor works on.
    pub fn node(&self, id: InteractorId) -> Option<&Arc<DataNode>> {
        self.interactors.get(id).and_then(|entry| entry.node.as_ref())
    }

    /// The current processing mode.
    pub fn processing_mode(&self) -> ProcessingMode {
        self.mode
    }

    /// The interactor the current mode refers to.
    pub fn selected_interactor(&self) -> Option<InteractorId> {
        self.selected
    }

    /// Notified after every processed event, including queued internal events.
    pub fn event_processed(&self) -> &Signal<(InteractionEvent, bool)> {
        &self.event_processed
    }

    /// Reset every interactor to its start state and return to regular processing.
    pub fn reset_interactors(&mut self) {
        for entry in self.interactors.values_mut() {
            entry.interactor.reset();
        }
        self.set_mode(ProcessingMode::Regular, None);
    }

    /// Queue an event to be processed after the current one.
    pub fn queue_event(&mut self, event: InteractionEvent) {
        self.queue.push_back(event);
    }

    /// Number of queued events.
    pub fn queued_events(&self) -> usize {
        self.queue.len()
    }

    /// Process `event`, then every queued event. Returns whether `event` was handled.
    pub fn process_event(&mut self, event: InteractionEvent) -> bool {
        let handled = self.dispatch(&event);
        self.event_processed.emit((event, handled));
        self.process_queued_events();
        handled
    }

    /// Process queued events until the queue is empty or [`MAX_QUEUED_EVENTS`]
    /// were processed. Returns how many were processed.
    pub fn process_queued_events(&mut self) -> usize {
        let mut processed = 0;
        while let Some(event) = self.queue.pop_front() {
            if processed == MAX_QUEUED_EVENTS {
                tracing::warn!(
                    target: targets::DISPATCHER,
                    dropped = self.queue.len() + 1,
                    signal = event.signal_name().unwrap_or_default(),
                    "queued event limit reached, dropping the rest"
                );
                self.queue.clear();
                break;
            }
            let handled = self.dispatch(&event);
            self.event_processed.emit((event, handled));
            processed += 1;
        }
        processed
    }

    /// Interactor IDs in regular dispatch order.
    pub fn dispatch_order(&self) -> Vec<InteractorId> {
        let mut order: Vec<(InteractorId, i64, u64)> = self
            .interactors
            .iter()
            .map(|(id, entry)| {
                let layer = entry.node.as_ref().map_or(0, |node| node.layer());
                (id, layer, entry.sequence)
            })
            .collect();
        order.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
        order.into_iter().map(|(id, _, _)| id).collect()
    }

    fn dispatch(&mut self, event: &InteractionEvent) -> bool {
        let handled_by = if let Some(target) = event.internal_target() {
            if self.contains(target) {
                self.offer(target, event).then_some(target)
            } else {
                tracing::trace!(target: targets::DISPATCHER, ?target, "target of internal event is gone");
                None
            }
        } else {
            match (self.mode, self.selected) {
                (ProcessingMode::GrabInput, Some(selected)) if self.contains(selected) => {
                    self.offer(selected, event).then_some(selected)
                }
                (
                    ProcessingMode::ConnectedMouseAction | ProcessingMode::PreferInput,
                    Some(selected),
                ) if self.contains(selected) => {
                    if self.offer(selected, event) {
                        Some(selected)
                    } else {
                        self.offer_in_order(event, Some(selected))
                    }
                }
                _ => self.offer_in_order(event, None),
            }
        };

        self.update_mode(handled_by, event);
        tracing::trace!(target: targets::DISPATCHER, class = %event.class(), handled = handled_by.is_some(), "event dispatched");
        handled_by.is_some()
    }

    fn offer_in_order(
        &mut self,
        event: &InteractionEvent,
        skip: Option<InteractorId>,
    ) -> Option<InteractorId> {
        self.dispatch_order()
            .into_iter()
            .filter(|id| Some(*id) != skip)
            .find(|id| self.offer(*id, event))
    }

    fn offer(&mut self, id: InteractorId, event: &InteractionEvent) -> bool {
        let Some(entry) = self.interactors.get_mut(id) else {
            return false;
        };
        let handled = entry.interactor.handle_event(event, entry.node.as_deref());
        for signal in entry.interactor.take_internal_signals() {
            tracing::trace!(target: targets::DISPATCHER, ?id, signal = %signal, "queued internal signal");
            self.queue
                .push_back(InteractionEvent::internal(signal, Some(id)));
        }
        handled
    }

    fn update_mode(&mut self, handled_by: Option<InteractorId>, event: &InteractionEvent) {
        let release = event.class() == EventClass::MouseReleaseEvent;
        let Some(id) = handled_by else {
            if release && self.mode == ProcessingMode::ConnectedMouseAction {
                self.set_mode(ProcessingMode::Regular, None);
            }
            return;
        };

        let state_mode = self
            .interactors
            .get(id)
            .map(|entry| entry.interactor.mode())
            .unwrap_or_default();
        match state_mode {
            StateMode::GrabInput => self.set_mode(ProcessingMode::GrabInput, Some(id)),
            StateMode::PreferInput => self.set_mode(ProcessingMode::PreferInput, Some(id)),
            StateMode::Regular if event.class() == EventClass::MousePressEvent => {
                self.set_mode(ProcessingMode::ConnectedMouseAction, Some(id));
            }
            StateMode::Regular
                if !release
                    && self.mode == ProcessingMode::ConnectedMouseAction
                    && self.selected == Some(id) => {}
            StateMode::Regular => self.set_mode(ProcessingMode::Regular, None),
        }
    }

    fn set_mode(&mut self, mode: ProcessingMode, selected: Option<InteractorId>) {
        if self.mode != mode || self.selected != selected {
            tracing::debug!(target: targets::DISPATCHER, ?mode, ?selected, "processing mode changed");
        }
        self.mode = mode;
        self.selected = selected;
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("interactors", &self.interactors.len())
            .field("mode", &self.mode)
            .field("selected", &self.selected)
            .field("queued", &self.queue.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{MouseButton, Point2};
    use parking_lot::Mutex;

    /// Records what it sees and handles events according to a fixed answer.
    struct Stub {
        name: String,
        answer: bool,
        mode: StateMode,
        seen: Arc<Mutex<Vec<String>>>,
        signals: Vec<String>,
        echo: Option<String>,
    }

    impl Stub {
        fn boxed(name: &str, answer: bool, seen: &Arc<Mutex<Vec<String>>>) -> Box<Self> {
            Box::new(Self {
                name: name.to_string(),
                answer,
                mode: StateMode::Regular,
                seen: seen.clone(),
                signals: Vec::new(),
                echo: None,
            })
        }
    }

    impl DataInteractor for Stub {
        fn handle_event(&mut self, event: &InteractionEvent, _node: Option<&DataNode>) -> bool {
            let label = event.signal_name().unwrap_or(event.class().name());
            self.seen.lock().push(format!("{}:{}", self.name, label));
            self.signals.extend(self.echo.clone());
            self.answer
        }

        fn mode(&self) -> StateMode {
            self.mode
        }

        fn take_internal_signals(&mut self) -> Vec<String> {
            std::mem::take(&mut self.signals)
        }

        fn reset(&mut self) {
            self.mode = StateMode::Regular;
        }

        fn name(&self) -> &str {
            &self.name
        }
    }

    fn layered(layer: i64) -> Option<Arc<DataNode>> {
        Some(Arc::new(DataNode::new("node").with_property("layer", layer)))
    }

    #[test]
    fn test_layer_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = Dispatcher::new();
        let low = dispatcher.add_interactor(Stub::boxed("low", false, &seen), layered(0));
        let high = dispatcher.add_interactor(Stub::boxed("high", false, &seen), layered(5));
        let tie = dispatcher.add_interactor(Stub::boxed("tie", false, &seen), None);
        assert_eq!(dispatcher.dispatch_order(), vec![high, low, tie]);

        assert!(!dispatcher.process_event(InteractionEvent::key("A")));
        assert_eq!(
            *seen.lock(),
            vec!["high:InteractionKeyEvent", "low:InteractionKeyEvent", "tie:InteractionKeyEvent"]
        );
    }

    #[test]
    fn test_first_handler_wins() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = Dispatcher::new();
        dispatcher.add_interactor(Stub::boxed("a", true, &seen), None);
        dispatcher.add_interactor(Stub::boxed("b", true, &seen), None);

        assert!(dispatcher.process_event(InteractionEvent::key("A")));
        assert_eq!(*seen.lock(), vec!["a:InteractionKeyEvent"]);
    }

    #[test]
    fn test_connected_mouse_action() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = Dispatcher::new();
        dispatcher.add_interactor(Stub::boxed("top", false, &seen), layered(1));
        let drag = dispatcher.add_interactor(Stub::boxed("drag", true, &seen), None);

        assert!(dispatcher.process_event(InteractionEvent::mouse_press(
            Point2::default(),
            MouseButton::Left
        )));
        assert_eq!(dispatcher.processing_mode(), ProcessingMode::ConnectedMouseAction);
        assert_eq!(dispatcher.selected_interactor(), Some(drag));

        seen.lock().clear();
        dispatcher.process_event(InteractionEvent::mouse_move(
            Point2::new(1.0, 1.0),
            MouseButton::Left.into(),
        ));
        assert_eq!(*seen.lock(), vec!["drag:MouseMoveEvent"]);

        dispatcher.process_event(InteractionEvent::mouse_release(
            Point2::new(1.0, 1.0),
            MouseButton::Left,
        ));
        assert_eq!(dispatcher.processing_mode(), ProcessingMode::Regular);
        assert_eq!(dispatcher.selected_interactor(), None);
    }

    #[test]
    fn test_grab_input_and_removal() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = Dispatcher::new();
        let mut grabber = Stub::boxed("grabber", true, &seen);
        grabber.mode = StateMode::GrabInput;
        let grabber = dispatcher.add_interactor(grabber, None);
        dispatcher.add_interactor(Stub::boxed("other", true, &seen), layered(-1));

        dispatcher.process_event(InteractionEvent::key("A"));
        assert_eq!(dispatcher.processing_mode(), ProcessingMode::GrabInput);

        seen.lock().clear();
        dispatcher.process_event(InteractionEvent::key("B"));
        assert_eq!(*seen.lock(), vec!["grabber:InteractionKeyEvent"]);

        assert!(dispatcher.remove_interactor(grabber).is_some());
        assert_eq!(dispatcher.processing_mode(), ProcessingMode::Regular);
        assert!(dispatcher.remove_interactor(grabber).is_none());

        seen.lock().clear();
        assert!(dispatcher.process_event(InteractionEvent::key("C")));
        assert_eq!(*seen.lock(), vec!["other:InteractionKeyEvent"]);
    }

    #[test]
    fn test_internal_signals_are_routed_to_sender() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = Dispatcher::new();
        dispatcher.add_interactor(Stub::boxed("first", false, &seen), layered(3));
        let mut raiser = Stub::boxed("raiser", true, &seen);
        raiser.signals = vec!["One".into(), "Two".into()];
        let raiser = dispatcher.add_interactor(raiser, None);

        let processed = Arc::new(Mutex::new(Vec::new()));
        let sink = processed.clone();
        dispatcher.event_processed().connect(move |(event, handled): &(InteractionEvent, bool)| {
            sink.lock().push((event.internal_target(), *handled));
        });

        assert!(dispatcher.process_event(InteractionEvent::key("A")));
        assert_eq!(
            *seen.lock(),
            vec!["first:InteractionKeyEvent", "raiser:InteractionKeyEvent", "raiser:One", "raiser:Two"]
        );
        assert_eq!(
            *processed.lock(),
            vec![(None, true), (Some(raiser), true), (Some(raiser), true)]
        );
        assert_eq!(dispatcher.queued_events(), 0);
    }

    #[test]
    fn test_endless_signals_are_cut_off() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = Dispatcher::new();
        let mut echo = Stub::boxed("echo", true, &seen);
        echo.echo = Some("Again".into());
        dispatcher.add_interactor(echo, None);

        assert!(dispatcher.process_event(InteractionEvent::key("A")));
        assert_eq!(seen.lock().len(), MAX_QUEUED_EVENTS + 1);
        assert_eq!(dispatcher.queued_events(), 0);

        // The next event starts with a fresh budget.
        seen.lock().clear();
        assert!(dispatcher.process_event(InteractionEvent::key("B")));
        assert_eq!(seen.lock().len(), MAX_QUEUED_EVENTS + 1);
    }

    #[test]
    fn test_internal_event_for_removed_target() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = Dispatcher::new();
        let gone = dispatcher.add_interactor(Stub::boxed("gone", true, &seen), None);
        dispatcher.add_interactor(Stub::boxed("stays", true, &seen), None);
        dispatcher.remove_interactor(gone);

        assert!(!dispatcher.process_event(InteractionEvent::internal("Ping", Some(gone))));
        assert!(seen.lock().is_empty());
    }
}
