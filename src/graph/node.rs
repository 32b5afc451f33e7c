//! Flow node type and its parent links.

use crate::error::StorageError;
use crate::graph::{Action, FlowExecution};
use parking_lot::RwLock;
use std::fmt;
use std::sync::{Arc, OnceLock, Weak};

/// Links from a node to its predecessors.
///
/// Nodes built by the execution engine may hold their parents directly; nodes that went
/// through the store always carry parent ids.
pub enum ParentLinks<A: Action> {
    InMemory(Vec<Arc<FlowNode<A>>>),
    OnDisk(Vec<String>),
}

impl<A: Action> ParentLinks<A> {
    pub fn is_in_memory(&self) -> bool {
        matches!(self, ParentLinks::InMemory(_))
    }

    pub fn len(&self) -> usize {
        match self {
            ParentLinks::InMemory(parents) => parents.len(),
            ParentLinks::OnDisk(ids) => ids.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Parent ids in declaration order
    pub fn ids(&self) -> Vec<String> {
        match self {
            ParentLinks::InMemory(parents) => parents.iter().map(|p| p.id().to_string()).collect(),
            ParentLinks::OnDisk(ids) => ids.clone(),
        }
    }
}

impl<A: Action> fmt::Debug for ParentLinks<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParentLinks::InMemory(_) => f.debug_tuple("InMemory").field(&self.ids()).finish(),
            ParentLinks::OnDisk(ids) => f.debug_tuple("OnDisk").field(ids).finish(),
        }
    }
}

/// A node in the execution trace graph.
pub struct FlowNode<A: Action> {
    id: String,
    parents: ParentLinks<A>,
    actions: RwLock<Vec<A>>,
    exec: OnceLock<Weak<dyn FlowExecution>>,
}

impl<A: Action> FlowNode<A> {
    /// Create a node whose parents are referenced by id.
    pub fn new(exec: &Arc<dyn FlowExecution>, id: impl Into<String>, parent_ids: Vec<String>) -> Self {
        let node = Self::detached(id.into(), ParentLinks::OnDisk(parent_ids));
        let _ = node.exec.set(Arc::downgrade(exec));
        node
    }

    /// Create a node holding its parents directly.
    pub fn with_parents(
        exec: &Arc<dyn FlowExecution>,
        id: impl Into<String>,
        parents: Vec<Arc<FlowNode<A>>>,
    ) -> Self {
        let node = Self::detached(id.into(), ParentLinks::InMemory(parents));
        let _ = node.exec.set(Arc::downgrade(exec));
        node
    }

    /// A node straight out of the codec: no execution, no actions.
    pub(crate) fn detached(id: String, parents: ParentLinks<A>) -> Self {
        Self {
            id,
            parents,
            actions: RwLock::new(Vec::new()),
            exec: OnceLock::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn parents(&self) -> &ParentLinks<A> {
        &self.parents
    }

    pub(crate) fn parents_mut(&mut self) -> &mut ParentLinks<A> {
        &mut self.parents
    }

    pub fn parent_ids(&self) -> Vec<String> {
        self.parents.ids()
    }

    /// Snapshot of the attached actions
    pub fn actions(&self) -> Vec<A> {
        self.actions.read().clone()
    }

    pub fn with_actions<R>(&self, f: impl FnOnce(&[A]) -> R) -> R {
        f(&self.actions.read())
    }

    pub fn add_action(&self, action: A) {
        self.actions.write().push(action);
    }

    /// The owning execution, if it is still alive.
    pub fn execution(&self) -> Option<Arc<dyn FlowExecution>> {
        self.exec.get().and_then(Weak::upgrade)
    }

    pub fn has_execution(&self) -> bool {
        self.exec.get().is_some()
    }

    pub(crate) fn attach_execution(&self, exec: &Weak<dyn FlowExecution>) -> Result<(), StorageError> {
        self.exec
            .set(exec.clone())
            .map_err(|_| StorageError::BackReference(self.id.clone()))
    }

    /// Replace the action list with what was read from disk.
    pub(crate) fn install_actions(&self, actions: Vec<A>) {
        *self.actions.write() = actions;
    }

    /// Swap the installed copies of the loaded actions for the instances whose load hooks
    /// ran. Actions appended by the hooks stay after them.
    pub(crate) fn adopt_loaded_actions(&self, loaded: &[A]) {
        let mut actions = self.actions.write();
        for (slot, action) in actions.iter_mut().zip(loaded) {
            *slot = action.clone();
        }
    }
}

impl<A: Action> fmt::Debug for FlowNode<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowNode")
            .field("id", &self.id)
            .field("parents", &self.parents)
            .field("actions", &*self.actions.read())
            .field("exec", &self.execution().map(|e| e.display_name()))
            .finish()
    }
}
