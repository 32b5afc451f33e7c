use flowstore::{Action, FlowExecution, FlowNode, SimpleFlowNodeStorage};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tempfile::TempDir;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StepAction {
    #[serde(rename = "label")]
    Label { text: String },
    #[serde(rename = "arg")]
    Argument { name: String, value: String },
}

impl Action for StepAction {}

pub fn label(text: &str) -> StepAction {
    StepAction::Label {
        text: text.to_string(),
    }
}

pub struct TestExecution {
    pub name: String,
}

impl FlowExecution for TestExecution {
    fn display_name(&self) -> String {
        self.name.clone()
    }
}

pub struct Harness {
    pub temp_dir: TempDir,
    pub exec: Arc<dyn FlowExecution>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
            exec: Arc::new(TestExecution {
                name: "job #1".to_string(),
            }),
        }
    }

    /// A fresh store over the same directory, as after a restart
    pub fn storage(&self) -> SimpleFlowNodeStorage<StepAction> {
        SimpleFlowNodeStorage::new(&self.exec, self.temp_dir.path().join("workflow"))
    }

    pub fn node(&self, id: &str, parents: &[&str]) -> Arc<FlowNode<StepAction>> {
        Arc::new(FlowNode::new(
            &self.exec,
            id,
            parents.iter().map(|p| p.to_string()).collect(),
        ))
    }
}
