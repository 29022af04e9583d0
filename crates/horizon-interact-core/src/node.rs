//! Data nodes: the target objects interactions operate on.
//!
//! A [`DataNode`] is a named holder of properties. The interaction engine never
//! looks at the data a node represents; it only reads properties such as
//! `"visible"` (event filtering) and `"layer"` (dispatch order).
//!
//! Nodes are usually shared (`Arc<DataNode>`) between the application and the
//! interactors bound to them, so property access goes through interior
//! mutability.
//!
//! [`DataStorage`] keeps nodes in an arena with stable [`NodeId`] handles.

use std::sync::Arc;

use parking_lot::RwLock;
use slotmap::{SlotMap, new_key_type};

use crate::error::{CoreError, CoreResult};
use crate::logging::targets;
use crate::property::{PropertyList, PropertyValue};

/// Name of the boolean property checked by the default event filter.
pub const VISIBLE_PROPERTY: &str = "visible";

/// Name of the integer property used to order interactors during dispatch.
pub const LAYER_PROPERTY: &str = "layer";

new_key_type! {
    /// A stable identifier for a node inside a [`DataStorage`].
    ///
    /// Becomes invalid once the node is removed.
    pub struct NodeId;
}

/// A named object carrying a property list.
pub struct DataNode {
    name: String,
    properties: RwLock<PropertyList>,
}

impl DataNode {
    /// Create a node with no properties.
    ///
    /// Note that a node without a `"visible"` property is rejected by the
    /// default event filter.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: RwLock::new(PropertyList::new()),
        }
    }

    /// Builder-style property setter.
    pub fn with_property(self, name: &str, value: impl Into<PropertyValue>) -> Self {
        self.properties.write().set(name, value);
        self
    }

    /// The node's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set a property value.
    pub fn set_property(&self, name: &str, value: impl Into<PropertyValue>) {
        let value = value.into();
        tracing::trace!(target: targets::NODE, node = %self.name, property = name, %value, "set property");
        self.properties.write().set(name, value);
    }

    /// Get a copy of a property value.
    pub fn property(&self, name: &str) -> Option<PropertyValue> {
        self.properties.read().get(name).cloned()
    }

    /// Check whether a property is present.
    pub fn has_property(&self, name: &str) -> bool {
        self.properties.read().contains(name)
    }

    /// Get a property that is stored as a real boolean.
    pub fn bool_property(&self, name: &str) -> CoreResult<bool> {
        self.properties.read().try_get_bool(name)
    }

    /// Get a property as an integer (with coercion).
    pub fn int_property(&self, name: &str) -> Option<i64> {
        self.properties.read().get_int(name)
    }

    /// Remove a property, returning the old value.
    pub fn remove_property(&self, name: &str) -> Option<PropertyValue> {
        self.properties.write().remove(name)
    }

    /// Names of all properties, sorted.
    pub fn property_names(&self) -> Vec<String> {
        self.properties
            .read()
            .names()
            .into_iter()
            .map(String::from)
            .collect()
    }

    /// Access the property list through a closure without cloning it.
    pub fn with_properties<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&PropertyList) -> R,
    {
        f(&self.properties.read())
    }

    /// Set the `"visible"` flag.
    pub fn set_visible(&self, visible: bool) {
        self.set_property(VISIBLE_PROPERTY, visible);
    }

    /// The `"visible"` flag, or `None` if the node has no boolean `"visible"` property.
    pub fn is_visible(&self) -> Option<bool> {
        self.bool_property(VISIBLE_PROPERTY).ok()
    }

    /// The `"layer"` property, defaulting to 0.
    pub fn layer(&self) -> i64 {
        self.int_property(LAYER_PROPERTY).unwrap_or(0)
    }
}

impl std::fmt::Debug for DataNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataNode")
            .field("name", &self.name)
            .field("properties", &self.property_names())
            .finish()
    }
}

/// Arena of shared data nodes.
#[derive(Default)]
pub struct DataStorage {
    nodes: SlotMap<NodeId, Arc<DataNode>>,
}

impl DataStorage {
    /// Create an empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node and return its ID.
    pub fn add(&mut self, node: DataNode) -> NodeId {
        let id = self.nodes.insert(Arc::new(node));
        tracing::trace!(target: targets::NODE, ?id, "added node");
        id
    }

    /// Remove a node. Outstanding `Arc`s keep the node alive but the ID becomes invalid.
    pub fn remove(&mut self, id: NodeId) -> CoreResult<Arc<DataNode>> {
        self.nodes.remove(id).ok_or(CoreError::InvalidNodeId)
    }

    /// Get a shared handle to a node.
    pub fn get(&self, id: NodeId) -> Option<Arc<DataNode>> {
        self.nodes.get(id).cloned()
    }

    /// Find the first node with the given name.
    pub fn find_by_name(&self, name: &str) -> Option<(NodeId, Arc<DataNode>)> {
        self.nodes
            .iter()
            .find(|(_, node)| node.name() == name)
            .map(|(id, node)| (id, node.clone()))
    }

    /// Number of stored nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the storage is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate over all nodes.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Arc<DataNode>)> {
        self.nodes.iter()
    }
}

impl std::fmt::Debug for DataStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataStorage")
            .field("node_count", &self.nodes.len())
            .finish()
    }
}
