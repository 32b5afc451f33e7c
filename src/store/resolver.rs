//! Parent reference resolution during decode.
//!
//! The codec may hand back nodes whose parents were resolved as object references. Each
//! decoded node is recorded in an [`IdRegistry`] keyed by allocation identity, and parent
//! references are rewritten to the recorded ids before the node leaves the decoder. The
//! registry lives exactly as long as one decode call.

use crate::error::StorageError;
use crate::graph::{Action, FlowNode, ParentLinks};
use std::collections::HashMap;
use std::sync::Arc;

/// Ids of the nodes decoded so far from one document.
pub struct IdRegistry<A: Action> {
    /// Decode order; also keeps every recorded allocation alive so addresses stay unique.
    decoded: Vec<Arc<FlowNode<A>>>,
    ids: HashMap<usize, String>,
    violation: Option<StorageError>,
}

impl<A: Action> Default for IdRegistry<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Action> IdRegistry<A> {
    pub fn new() -> Self {
        Self {
            decoded: Vec::new(),
            ids: HashMap::new(),
            violation: None,
        }
    }

    fn key(node: &Arc<FlowNode<A>>) -> usize {
        Arc::as_ptr(node) as *const () as usize
    }

    /// Record the on-disk id of a freshly decoded node.
    pub fn record(&mut self, node: &Arc<FlowNode<A>>, id: impl Into<String>) {
        self.ids.insert(Self::key(node), id.into());
        self.decoded.push(Arc::clone(node));
    }

    pub fn id_of(&self, node: &Arc<FlowNode<A>>) -> Option<&str> {
        self.ids.get(&Self::key(node)).map(String::as_str)
    }

    /// The node decoded at `position` in document order.
    pub fn decoded_at(&self, position: usize) -> Option<&Arc<FlowNode<A>>> {
        self.decoded.get(position)
    }

    pub fn len(&self) -> usize {
        self.decoded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decoded.is_empty()
    }

    pub(crate) fn note_violation(&mut self, err: StorageError) {
        if self.violation.is_none() {
            self.violation = Some(err);
        }
    }

    pub(crate) fn take_violation(&mut self) -> Option<StorageError> {
        self.violation.take()
    }
}

/// Rewrite in-memory parent references of `node` into the ids recorded in `registry`.
///
/// Nodes already carrying parent ids are left untouched.
pub fn resolve_parents<A: Action>(
    node: &mut FlowNode<A>,
    registry: &IdRegistry<A>,
) -> Result<(), StorageError> {
    let parents = match node.parents() {
        ParentLinks::OnDisk(_) => return Ok(()),
        ParentLinks::InMemory(parents) => parents,
    };

    let mut parent_ids = Vec::with_capacity(parents.len());
    for (position, parent) in parents.iter().enumerate() {
        match registry.id_of(parent) {
            Some(id) => parent_ids.push(id.to_string()),
            None => {
                tracing::error!(
                    node = node.id(),
                    position,
                    parent = parent.id(),
                    "Parent reference was not decoded from this record"
                );
                return Err(StorageError::UnresolvedParent {
                    node: node.id().to_string(),
                    position,
                });
            }
        }
    }

    *node.parents_mut() = ParentLinks::OnDisk(parent_ids);
    Ok(())
}
