//! Core data holders for Horizon Interact.
//!
//! This crate provides the pieces the interaction engine shares with the rest
//! of an application:
//!
//! - **Property lists**: loosely typed, string-keyed values ([`PropertyList`])
//! - **Data nodes**: named target objects carrying properties ([`DataNode`]),
//!   stored in an arena with stable IDs ([`DataStorage`])
//! - **Signals**: synchronous slot notifications ([`Signal`])
//! - **Logging**: `tracing` targets and span helpers ([`logging`])
//!
//! # Example
//!
//! ```
//! use horizon_interact_core::{DataNode, DataStorage};
//!
//! let mut storage = DataStorage::new();
//! let id = storage.add(DataNode::new("liver").with_property("visible", true));
//!
//! let node = storage.get(id).unwrap();
//! assert_eq!(node.is_visible(), Some(true));
//!
//! node.set_visible(false);
//! assert_eq!(node.is_visible(), Some(false));
//! ```

mod error;
pub mod logging;
pub mod node;
pub mod property;
pub mod signal;

pub use error::{CoreError, CoreResult};
pub use logging::PerfSpan;
pub use node::{DataNode, DataStorage, LAYER_PROPERTY, NodeId, VISIBLE_PROPERTY};
pub use property::{PropertyList, PropertyValue};
pub use signal::{ConnectionId, Signal};
