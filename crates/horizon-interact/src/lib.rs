//! Configurable event state machines for interactive data tools.
//!
//! Horizon Interact turns raw user input into tool behavior in two data-driven
//! steps:
//!
//! - An [`EventConfig`] maps concrete events (a left click with Ctrl held, the
//!   wheel scrolled up) to **event variant** names such as `"AddPoint"`.
//! - A [`Behavior`] graph describes states and the transitions a variant
//!   triggers, including guard conditions and the actions to run.
//!
//! An [`EventStateMachine`] combines both with an [`Interactor`], the tool
//! logic that provides the named actions and conditions. Many state machines
//! can share one [`Dispatcher`], which decides who gets each event.
//!
//! Behaviors and configurations are XML resources looked up by `(module,
//! file)` through a [`ResourceManager`]. The built-in module
//! [`resource::BUILTIN_MODULE`] ships the documents of the interactors in
//! [`tools`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use horizon_interact::tools::SliceNavigator;
//! use horizon_interact::{Dispatcher, EventStateMachine, InteractionEvent, Point2};
//! use horizon_interact::resource::BUILTIN_MODULE;
//! use horizon_interact_core::DataNode;
//!
//! let mut navigator = EventStateMachine::new(SliceNavigator::new(10));
//! navigator.load_state_machine("SliceNavigation.xml", BUILTIN_MODULE).unwrap();
//! navigator.load_event_config("DisplayConfig.xml", BUILTIN_MODULE).unwrap();
//!
//! let mut dispatcher = Dispatcher::new();
//! let id = dispatcher.add(navigator, Some(Arc::new(DataNode::new("image"))));
//!
//! assert!(dispatcher.process_event(InteractionEvent::wheel(Point2::default(), 120)));
//! # let _ = id;
//! ```
//!
//! # Logging
//!
//! Every module logs through `tracing` under the targets in
//! [`horizon_interact_core::logging::targets`].

pub mod actions;
pub mod behavior;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod interactor;
pub mod resource;
pub mod state_machine;
pub mod tools;
pub mod xml;

pub use actions::{ActionContext, ActionHandler, ActionRegistry, ConditionRegistry};
pub use behavior::{
    Action, Behavior, BehaviorBuilder, BehaviorCache, Condition, State, StateId, StateMode,
    Transition, TransitionSpec,
};
pub use config::{EventConfig, EventMapping};
pub use dispatcher::{DataInteractor, Dispatcher, InteractorId, ProcessingMode};
pub use error::{Error, Result};
pub use event::{
    EventClass, EventData, EventFactory, InteractionEvent, KeyboardModifiers, MouseButton,
    MouseButtons, Point2, Point3, RenderContext,
};
pub use interactor::{Interactor, default_event_filter};
pub use resource::{EmbeddedDir, ResourceManager};
pub use state_machine::{EventStateMachine, StateChange};

pub use horizon_interact_core;
