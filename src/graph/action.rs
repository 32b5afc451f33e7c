//! Collaborator contracts: node actions and the owning execution.

use crate::graph::FlowNode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;

/// Metadata attached to a flow node and persisted alongside it.
///
/// Implementors are usually a serde enum; `#[serde(rename = "..")]` keeps the persisted
/// type tags short.
pub trait Action: Serialize + DeserializeOwned + Clone + fmt::Debug + Send + Sync + 'static {
    /// Invoked at most once per load, after the node's execution back-reference and
    /// action list are installed. Derived state that is not serialized is rebuilt here.
    fn on_load(&self, _node: &FlowNode<Self>) {}
}

/// The execution that owns a set of flow nodes.
pub trait FlowExecution: Send + Sync {
    /// Used in log lines only.
    fn display_name(&self) -> String;
}
