use crate::integration::support::{Harness, StepAction};
use flowstore::store::NodeFileRepository;
use flowstore::FlowNode;
use proptest::prelude::*;
use std::sync::Arc;

fn action() -> impl Strategy<Value = StepAction> {
    prop_oneof![
        "[a-z ]{0,12}".prop_map(|text| StepAction::Label { text }),
        ("[a-z]{1,6}", "[a-zA-Z0-9/]{0,10}")
            .prop_map(|(name, value)| StepAction::Argument { name, value }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn record_preserves_parent_order_and_actions(
        parents in prop::collection::vec("[a-z0-9-]{1,8}", 0..6),
        actions in prop::collection::vec(action(), 0..4),
    ) {
        let harness = Harness::new();
        let repository = NodeFileRepository::new(harness.temp_dir.path(), true);
        let node = FlowNode::<StepAction>::new(&harness.exec, "n", parents.clone());
        repository.write(&node, &actions).unwrap();

        let tag = repository.read::<StepAction>("n", &Arc::downgrade(&harness.exec)).unwrap();
        prop_assert_eq!(tag.node().id(), "n");
        prop_assert_eq!(tag.node().parent_ids(), parents);
        prop_assert_eq!(tag.actions(), &actions[..]);
        prop_assert_eq!(tag.node().actions(), actions);
    }
}
