//! Flow Graph
//!
//! In-memory model of an execution trace: nodes, their parent links, and the actions
//! attached to them. Nodes are immutable after creation apart from their action list.

pub mod action;
pub mod node;

pub use action::{Action, FlowExecution};
pub use node::{FlowNode, ParentLinks};
