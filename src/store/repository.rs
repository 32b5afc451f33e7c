//! Node file repository
//!
//! One file per node id inside the execution's storage directory. Reads wire the
//! decoded node back to its execution before any action hook runs.

use crate::error::StorageError;
use crate::graph::{Action, FlowExecution, FlowNode};
use crate::store::atomic;
use crate::store::resolver::IdRegistry;
use crate::store::tag::{self, Tag, NODE_FILE_EXTENSION};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Weak;
use tracing::{debug, error, warn};

pub struct NodeFileRepository {
    dir: PathBuf,
    atomic: bool,
}

/// Ids become file names, so they must be a single plain path segment.
fn is_safe_segment(id: &str) -> bool {
    !id.is_empty()
        && id != "."
        && id != ".."
        && !id.contains(['/', '\\', '\0'])
}

impl NodeFileRepository {
    pub fn new(dir: impl Into<PathBuf>, atomic: bool) -> Self {
        Self {
            dir: dir.into(),
            atomic,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn is_atomic(&self) -> bool {
        self.atomic
    }

    pub fn path_for(&self, id: &str) -> Result<PathBuf, StorageError> {
        if !is_safe_segment(id) {
            return Err(StorageError::InvalidPath(id.to_string()));
        }
        Ok(self.dir.join(format!("{}.{}", id, NODE_FILE_EXTENSION)))
    }

    pub fn exists(&self, id: &str) -> Result<bool, StorageError> {
        Ok(self.path_for(id)?.is_file())
    }

    /// Persist `node` with `actions`, replacing any earlier record.
    pub fn write<A: Action>(&self, node: &FlowNode<A>, actions: &[A]) -> Result<(), StorageError> {
        let path = self.path_for(node.id())?;
        let bytes = tag::encode(node, actions).map_err(|source| StorageError::Codec {
            path: path.clone(),
            source,
        })?;
        atomic::write_file(&path, &bytes, self.atomic)?;
        debug!(
            node = node.id(),
            actions = actions.len(),
            path = %path.display(),
            "Wrote flow node"
        );
        Ok(())
    }

    /// Load the record for `id` and attach it to `exec`.
    pub fn read<A: Action>(
        &self,
        id: &str,
        exec: &Weak<dyn FlowExecution>,
    ) -> Result<Tag<A>, StorageError> {
        let path = self.path_for(id)?;
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(StorageError::NotFound(path)),
            Err(e) => return Err(e.into()),
        };

        let decoded = {
            let mut registry = IdRegistry::new();
            match tag::decode::<A>(&bytes, &mut registry) {
                Ok(decoded) => decoded,
                Err(source) => {
                    return Err(registry
                        .take_violation()
                        .unwrap_or(StorageError::Codec { path, source }));
                }
            }
        };

        let node = match decoded.node {
            Some(node) => node,
            None => {
                let content = String::from_utf8_lossy(&bytes).into_owned();
                error!(path = %path.display(), "Flow node record has no node");
                return Err(StorageError::CorruptRecord { path, content });
            }
        };
        if node.id() != id {
            warn!(requested = id, stored = node.id(), "Flow node record id does not match its file name");
        }

        if let Err(err) = node.attach_execution(exec) {
            error!(node = node.id(), "Could not wire flow node to its execution");
            return Err(err);
        }
        // Hooks run on the owned list so no node lock is held while they execute
        let loaded = decoded.actions;
        node.install_actions(loaded.clone());
        for action in &loaded {
            action.on_load(&node);
        }
        node.adopt_loaded_actions(&loaded);

        debug!(node = node.id(), actions = loaded.len(), "Loaded flow node");
        Ok(Tag::new(node, loaded))
    }
}
