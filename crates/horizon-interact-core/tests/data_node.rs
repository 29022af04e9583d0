//! Integration tests for data nodes shared between the application and tools.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use horizon_interact_core::{
    CoreError, DataNode, DataStorage, PropertyValue, Signal, VISIBLE_PROPERTY,
};

#[test]
fn shared_node_sees_property_updates() {
    let mut storage = DataStorage::new();
    let id = storage.add(DataNode::new("tumor"));

    let app_handle = storage.get(id).unwrap();
    let tool_handle = storage.get(id).unwrap();

    app_handle.set_visible(true);
    assert_eq!(tool_handle.is_visible(), Some(true));

    app_handle.remove_property(VISIBLE_PROPERTY);
    assert_eq!(tool_handle.is_visible(), None);
    assert_eq!(
        tool_handle.bool_property(VISIBLE_PROPERTY),
        Err(CoreError::PropertyNotFound(VISIBLE_PROPERTY.to_string()))
    );
}

#[test]
fn node_outlives_storage_entry() {
    let mut storage = DataStorage::new();
    let id = storage.add(DataNode::new("vessel").with_property("opacity", 0.5));
    let handle = storage.get(id).unwrap();

    storage.remove(id).unwrap();
    assert!(storage.get(id).is_none());
    assert_eq!(handle.property("opacity"), Some(PropertyValue::Float(0.5)));
}

#[test]
fn property_change_notification() {
    let node = Arc::new(DataNode::new("bone"));
    let changed = Signal::<String>::new();
    let hits = Arc::new(AtomicUsize::new(0));

    let observed = node.clone();
    let counter = hits.clone();
    changed.connect(move |name| {
        if observed.has_property(name) {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    });

    node.set_property("color", "white");
    changed.emit("color".to_string());
    changed.emit("missing".to_string());

    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(node.property_names(), vec!["color".to_string()]);
}
