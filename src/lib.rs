//! Flowstore: Durable Flow Node Storage
//!
//! Stores the nodes of a flow execution graph one file per node. Nodes are cached in
//! memory once loaded, writes can be deferred until the execution decides a node is
//! worth persisting, and parent links are always persisted as node ids so each file can
//! be read on its own.

pub mod config;
pub mod error;
pub mod graph;
pub mod logging;
pub mod store;

pub use error::{SetupError, StorageError};
pub use graph::{Action, FlowExecution, FlowNode, ParentLinks};
pub use store::{FlowNodeStorage, SimpleFlowNodeStorage};
