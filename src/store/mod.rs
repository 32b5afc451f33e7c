//! Flow Node Store
//!
//! Durable storage for the nodes of one execution. Nodes are looked up by id and written
//! one file per node; writes can be postponed until the execution reaches a point where
//! persisting them is worthwhile.

pub mod atomic;
pub mod cache;
pub mod deferred;
pub mod repository;
pub mod resolver;
pub mod simple;
pub mod tag;

use crate::error::StorageError;
use crate::graph::{Action, FlowNode};
use std::sync::Arc;

pub use cache::{CacheStats, NodeCache};
pub use repository::NodeFileRepository;
pub use simple::SimpleFlowNodeStorage;
pub use tag::Tag;

/// Storage interface used by the execution engine.
///
/// Mutating operations take `&mut self`: callers serialize mutations of one execution's
/// nodes, typically by holding the store behind a lock.
pub trait FlowNodeStorage<A: Action> {
    /// Look up a node. A node that was never written is `Ok(None)`.
    fn get_node(&self, id: &str) -> Result<Option<Arc<FlowNode<A>>>, StorageError>;

    /// Store a node, either now or, with `delay_write`, at the next flush.
    fn store_node_with(&mut self, node: Arc<FlowNode<A>>, delay_write: bool) -> Result<(), StorageError>;

    fn store_node(&mut self, node: Arc<FlowNode<A>>) -> Result<(), StorageError> {
        self.store_node_with(node, false)
    }

    /// Write the node now if its write was deferred, and re-enable autopersist for it.
    fn autopersist(&mut self, node: &Arc<FlowNode<A>>) -> Result<(), StorageError>;

    /// Write the node with its current actions, regardless of deferral.
    fn flush_node(&mut self, node: &Arc<FlowNode<A>>) -> Result<(), StorageError>;

    /// Write every deferred node.
    fn flush(&mut self) -> Result<(), StorageError>;

    /// Persist `node` with `actions`.
    ///
    /// `actions` is expected to match the node's own list; nothing checks it. If the node
    /// is autopersist exempt, it is only buffered again and `actions` is discarded: the next
    /// flush writes the node's own actions instead.
    fn save_actions(&mut self, node: &Arc<FlowNode<A>>, actions: &[A]) -> Result<(), StorageError>;

    /// Actions persisted for `node`; empty if it has never been written.
    fn load_actions(&self, node: &FlowNode<A>) -> Result<Vec<A>, StorageError>;

    /// Whether nothing is waiting in the deferred-write buffer
    fn is_persisted_fully(&self) -> bool;
}
