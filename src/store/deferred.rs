//! Deferred-write bookkeeping.
//!
//! `pending` holds nodes whose write was postponed; it is the only home of their latest
//! state until they are flushed, so lookups consult it before the cache. `exempt` holds
//! ids that skip the automatic write in `save_actions` until autopersist is re-enabled.
//! Membership in the two sets changes independently: flushing clears `pending` only and
//! autopersist clears `exempt`.

use crate::graph::{Action, FlowNode};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

pub struct DeferredWrites<A: Action> {
    pending: BTreeMap<String, Arc<FlowNode<A>>>,
    exempt: HashSet<String>,
}

impl<A: Action> Default for DeferredWrites<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Action> DeferredWrites<A> {
    pub fn new() -> Self {
        Self {
            pending: BTreeMap::new(),
            exempt: HashSet::new(),
        }
    }

    /// Postpone writing `node` and exempt it from autopersist.
    pub fn defer(&mut self, node: Arc<FlowNode<A>>) {
        self.exempt.insert(node.id().to_string());
        self.pending.insert(node.id().to_string(), node);
    }

    /// Replace the buffered node without touching its exemption.
    pub fn replace(&mut self, node: Arc<FlowNode<A>>) {
        self.pending.insert(node.id().to_string(), node);
    }

    pub fn get(&self, id: &str) -> Option<&Arc<FlowNode<A>>> {
        self.pending.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.pending.contains_key(id)
    }

    pub fn remove(&mut self, id: &str) -> Option<Arc<FlowNode<A>>> {
        self.pending.remove(id)
    }

    pub fn is_exempt(&self, id: &str) -> bool {
        self.exempt.contains(id)
    }

    pub fn release_exemption(&mut self, id: &str) -> bool {
        self.exempt.remove(id)
    }

    /// Buffered nodes in id order
    pub fn pending(&self) -> impl Iterator<Item = &Arc<FlowNode<A>>> {
        self.pending.values()
    }

    pub fn pending_ids(&self) -> Vec<String> {
        self.pending.keys().cloned().collect()
    }

    pub fn clear_pending(&mut self) {
        self.pending.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }
}
