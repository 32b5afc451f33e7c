//! One-file-per-node store with deferred writes.
//!
//! Lookups go to the deferred-write buffer first, since a buffered node is newer than
//! anything on disk, then to the cache, which loads from disk on a miss. Every write goes
//! through the cache so the latest written node is what later lookups see.

use crate::config::StorageConfig;
use crate::error::StorageError;
use crate::graph::{Action, FlowExecution, FlowNode};
use crate::store::cache::{CacheStats, NodeCache};
use crate::store::deferred::DeferredWrites;
use crate::store::repository::NodeFileRepository;
use crate::store::tag::Tag;
use crate::store::FlowNodeStorage;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use tracing::{debug, info, trace};

pub struct SimpleFlowNodeStorage<A: Action> {
    exec: Weak<dyn FlowExecution>,
    repository: NodeFileRepository,
    cache: NodeCache<A>,
    deferred: DeferredWrites<A>,
}

impl<A: Action> SimpleFlowNodeStorage<A> {
    pub fn new(exec: &Arc<dyn FlowExecution>, dir: impl Into<PathBuf>) -> Self {
        Self::with_config(exec, dir, &StorageConfig::default())
    }

    pub fn with_config(
        exec: &Arc<dyn FlowExecution>,
        dir: impl Into<PathBuf>,
        config: &StorageConfig,
    ) -> Self {
        Self {
            exec: Arc::downgrade(exec),
            repository: NodeFileRepository::new(dir, !config.avoid_atomic_write),
            cache: NodeCache::new(config.cache_capacity),
            deferred: DeferredWrites::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        self.repository.dir()
    }

    /// Path of the file backing `id`.
    pub fn node_file(&self, id: &str) -> Result<PathBuf, StorageError> {
        self.repository.path_for(id)
    }

    pub fn cache(&self) -> &NodeCache<A> {
        &self.cache
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Ids whose writes are still deferred
    pub fn pending_ids(&self) -> Vec<String> {
        self.deferred.pending_ids()
    }

    pub fn is_autopersist_exempt(&self, id: &str) -> bool {
        self.deferred.is_exempt(id)
    }

    fn write_node(&self, node: &Arc<FlowNode<A>>, actions: &[A]) -> Result<(), StorageError> {
        self.cache.insert(node.clone());
        self.repository.write(node, actions)
    }

    fn load(&self, id: &str) -> Result<Tag<A>, StorageError> {
        self.repository.read(id, &self.exec)
    }

    fn exec_name(&self) -> String {
        self.exec
            .upgrade()
            .map(|exec| exec.display_name())
            .unwrap_or_else(|| "<dropped>".to_string())
    }
}

impl<A: Action> FlowNodeStorage<A> for SimpleFlowNodeStorage<A> {
    fn get_node(&self, id: &str) -> Result<Option<Arc<FlowNode<A>>>, StorageError> {
        if let Some(node) = self.deferred.get(id) {
            return Ok(Some(node.clone()));
        }

        match self.cache.get_or_load(id, || self.load(id).map(|tag| tag.into_parts().0)) {
            Ok(node) => Ok(Some(node)),
            Err(err) if err.is_not_found() => {
                trace!(node = id, exec = %self.exec_name(), "Tried to load flow node where file does not exist");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    fn store_node_with(&mut self, node: Arc<FlowNode<A>>, delay_write: bool) -> Result<(), StorageError> {
        if delay_write {
            debug!(node = node.id(), "Deferring flow node write");
            self.deferred.defer(node);
            Ok(())
        } else {
            self.flush_node(&node)
        }
    }

    fn autopersist(&mut self, node: &Arc<FlowNode<A>>) -> Result<(), StorageError> {
        if self.deferred.contains(node.id()) {
            self.flush_node(node)?;
        }
        self.deferred.release_exemption(node.id());
        Ok(())
    }

    fn flush_node(&mut self, node: &Arc<FlowNode<A>>) -> Result<(), StorageError> {
        let actions = node.actions();
        self.write_node(node, &actions)?;
        self.deferred.remove(node.id());
        Ok(())
    }

    fn flush(&mut self) -> Result<(), StorageError> {
        if self.deferred.is_empty() {
            return Ok(());
        }
        for node in self.deferred.pending() {
            let actions = node.actions();
            self.write_node(node, &actions)?;
        }
        info!(
            count = self.deferred.len(),
            exec = %self.exec_name(),
            "Flushed deferred flow nodes"
        );
        self.deferred.clear_pending();
        Ok(())
    }

    fn save_actions(&mut self, node: &Arc<FlowNode<A>>, actions: &[A]) -> Result<(), StorageError> {
        if self.deferred.is_exempt(node.id()) {
            // The supplied list is dropped; the node's own actions are written on flush.
            debug!(node = node.id(), "Autopersist exempt, buffering flow node");
            self.deferred.replace(node.clone());
            Ok(())
        } else {
            self.write_node(node, actions)
        }
    }

    fn load_actions(&self, node: &FlowNode<A>) -> Result<Vec<A>, StorageError> {
        if !self.repository.exists(node.id())? {
            return Ok(Vec::new());
        }
        match self.load(node.id()) {
            Ok(tag) => Ok(tag.into_parts().1),
            Err(err) if err.is_not_found() => Ok(Vec::new()),
            Err(err) => Err(err),
        }
    }

    fn is_persisted_fully(&self) -> bool {
        self.deferred.is_empty()
    }
}
