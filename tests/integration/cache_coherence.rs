use crate::integration::support::{label, Harness};
use flowstore::FlowNodeStorage;
use std::sync::Arc;
use std::thread;

#[test]
fn written_node_is_served_from_cache() {
    let harness = Harness::new();
    let mut storage = harness.storage();
    let node = harness.node("1", &[]);
    storage.store_node(node.clone()).unwrap();

    // Reclamation may not drop a node somebody still holds
    storage.cache().reclaim();

    let found = storage.get_node("1").unwrap().unwrap();
    assert!(Arc::ptr_eq(&found, &node));
    assert_eq!(storage.cache_stats().loads, 0);
}

#[test]
fn reclaimed_node_is_reloaded_from_disk() {
    let harness = Harness::new();
    let mut storage = harness.storage();
    let node = harness.node("2", &["1"]);
    node.add_action(label("sh"));
    storage.store_node(node).unwrap();

    assert_eq!(storage.cache().reclaim(), 1);
    let reloaded = storage.get_node("2").unwrap().unwrap();
    assert_eq!(reloaded.parent_ids(), vec!["1".to_string()]);
    assert_eq!(reloaded.actions(), vec![label("sh")]);
    assert_eq!(storage.cache_stats().loads, 1);
}

#[test]
fn concurrent_lookups_load_once() {
    let harness = Harness::new();
    {
        let mut storage = harness.storage();
        storage.store_node(harness.node("3", &[])).unwrap();
    }

    let storage = harness.storage();
    let found: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| storage.get_node("3").unwrap().unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(found.iter().all(|n| Arc::ptr_eq(n, &found[0])));
    assert_eq!(storage.cache_stats().loads, 1);
}

#[test]
fn deferred_nodes_stay_out_of_the_cache() {
    let harness = Harness::new();
    let mut storage = harness.storage();
    storage.store_node_with(harness.node("4", &[]), true).unwrap();
    assert!(storage.cache().peek("4").is_none());

    storage.flush().unwrap();
    assert!(storage.cache().peek("4").is_some());
}
