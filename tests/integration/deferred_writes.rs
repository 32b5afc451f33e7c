use crate::integration::support::{label, Harness};
use flowstore::FlowNodeStorage;
use std::sync::Arc;

#[test]
fn deferred_node_is_served_before_it_reaches_disk() {
    let harness = Harness::new();
    let mut storage = harness.storage();
    let node = harness.node("3", &["2"]);
    storage.store_node_with(node.clone(), true).unwrap();

    let found = storage.get_node("3").unwrap().unwrap();
    assert!(Arc::ptr_eq(&found, &node));
    assert!(!storage.node_file("3").unwrap().exists());
    assert!(storage.load_actions(&node).unwrap().is_empty());
    assert!(!storage.is_persisted_fully());
}

#[test]
fn flush_writes_every_deferred_node() {
    let harness = Harness::new();
    let mut storage = harness.storage();
    for id in ["1", "2", "3"] {
        storage.store_node_with(harness.node(id, &[]), true).unwrap();
    }
    assert_eq!(storage.pending_ids().len(), 3);

    storage.flush().unwrap();
    assert!(storage.is_persisted_fully());

    let fresh = harness.storage();
    for id in ["1", "2", "3"] {
        assert_eq!(fresh.get_node(id).unwrap().unwrap().id(), id);
    }
}

#[test]
fn flush_with_nothing_deferred_is_a_no_op() {
    let harness = Harness::new();
    let mut storage = harness.storage();
    storage.flush().unwrap();
    assert!(storage.is_persisted_fully());
    assert!(!storage.dir().exists());
}

// save_actions on an exempt node buffers the node and drops the supplied list;
// the node's own actions are what eventually reach disk.
#[test]
fn save_actions_on_exempt_node_defers_and_ignores_supplied_actions() {
    let harness = Harness::new();
    let mut storage = harness.storage();
    let node = harness.node("5", &["4"]);
    node.add_action(label("own"));
    storage.store_node_with(node.clone(), true).unwrap();

    storage.save_actions(&node, &[label("explicit")]).unwrap();
    assert!(!storage.node_file("5").unwrap().exists());
    assert_eq!(storage.pending_ids(), vec!["5".to_string()]);

    storage.autopersist(&node).unwrap();
    assert!(storage.node_file("5").unwrap().exists());
    assert!(storage.is_persisted_fully());
    assert!(!storage.is_autopersist_exempt("5"));

    let fresh = harness.storage();
    let reloaded = fresh.get_node("5").unwrap().unwrap();
    assert_eq!(reloaded.actions(), vec![label("own")]);
}

#[test]
fn save_actions_after_autopersist_writes_supplied_actions() {
    let harness = Harness::new();
    let mut storage = harness.storage();
    let node = harness.node("6", &[]);
    storage.store_node_with(node.clone(), true).unwrap();
    storage.autopersist(&node).unwrap();

    storage.save_actions(&node, &[label("explicit")]).unwrap();
    assert_eq!(storage.load_actions(&node).unwrap(), vec![label("explicit")]);
}

#[test]
fn flushed_but_still_exempt_node_is_buffered_again() {
    let harness = Harness::new();
    let mut storage = harness.storage();
    let node = harness.node("8", &[]);
    storage.store_node_with(node.clone(), true).unwrap();
    storage.flush_node(&node).unwrap();
    assert!(storage.is_persisted_fully());

    storage.save_actions(&node, &[label("late")]).unwrap();
    assert!(!storage.is_persisted_fully());
    assert!(storage.load_actions(&node).unwrap().is_empty());
}

#[test]
fn autopersist_on_undeferred_node_writes_nothing() {
    let harness = Harness::new();
    let mut storage = harness.storage();
    let node = harness.node("10", &[]);
    storage.autopersist(&node).unwrap();
    assert!(storage.get_node("10").unwrap().is_none());
}
