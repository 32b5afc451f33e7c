use crate::integration::support::{label, Harness, StepAction};
use flowstore::{FlowNodeStorage, StorageError};
use std::fs;

#[test]
fn nodes_reload_by_parent_id_after_restart() {
    let harness = Harness::new();
    {
        let mut storage = harness.storage();
        let n1 = harness.node("n1", &[]);
        let n2 = harness.node("n2", &["n1"]);
        n2.add_action(label("checkout"));
        storage.store_node(n1).unwrap();
        storage.store_node(n2).unwrap();
    }

    let storage = harness.storage();
    let n2 = storage.get_node("n2").unwrap().unwrap();
    assert_eq!(n2.parent_ids(), vec!["n1".to_string()]);
    assert!(!n2.parents().is_in_memory());
    assert_eq!(n2.actions(), vec![label("checkout")]);
    assert_eq!(n2.execution().unwrap().display_name(), "job #1");

    let restarted = harness.storage();
    let n1 = restarted.get_node("n1").unwrap().unwrap();
    assert!(n1.parent_ids().is_empty());
    assert!(n1.actions().is_empty());
}

#[test]
fn unknown_node_is_absent_not_an_error() {
    let harness = Harness::new();
    let storage = harness.storage();
    assert!(storage.get_node("never-written").unwrap().is_none());
}

#[test]
fn corrupt_record_is_reported_not_hidden() {
    let harness = Harness::new();
    let storage = harness.storage();
    fs::create_dir_all(storage.dir()).unwrap();
    fs::write(storage.node_file("7").unwrap(), r#"{"node": null}"#).unwrap();

    match storage.get_node("7") {
        Err(StorageError::CorruptRecord { content, .. }) => assert!(content.contains("null")),
        other => panic!("expected corrupt record, got {:?}", other.map(|n| n.is_some())),
    }
}

#[test]
fn object_graph_records_load_as_parent_ids() {
    let harness = Harness::new();
    let storage = harness.storage();
    fs::create_dir_all(storage.dir()).unwrap();
    fs::write(
        storage.node_file("9").unwrap(),
        r#"{
            "node": {
                "id": "9",
                "parents": [
                    {"id": "7", "parentIds": ["6"]},
                    {"id": "8", "parents": [{"ref": 0}]}
                ]
            },
            "actions": [{"type": "arg", "name": "branch", "value": "main"}]
        }"#,
    )
    .unwrap();

    let node = storage.get_node("9").unwrap().unwrap();
    assert_eq!(node.parent_ids(), vec!["7".to_string(), "8".to_string()]);
    assert_eq!(
        node.actions(),
        vec![StepAction::Argument {
            name: "branch".to_string(),
            value: "main".to_string(),
        }]
    );

    // The rewritten record persists ids only
    let mut storage = storage;
    storage.flush_node(&node).unwrap();
    let record = fs::read_to_string(storage.node_file("9").unwrap()).unwrap();
    assert!(record.contains("parentIds"));
    assert!(!record.contains("\"parents\""));
}
