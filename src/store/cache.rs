//! Node cache
//!
//! Maps node ids to loaded nodes. A miss triggers exactly one load per id even when
//! several threads ask at once: callers share a per-id slot and the first one in loads
//! while the others wait on the slot lock.
//!
//! Retention is soft. Once the cache grows past its capacity, entries that no caller
//! holds any more are dropped; they are reloaded from disk on the next miss. Only nodes
//! that were written or read from disk ever enter the cache.

use crate::error::StorageError;
use crate::graph::{Action, FlowNode};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

type Slot<A> = Arc<Mutex<Option<Arc<FlowNode<A>>>>>;

/// Counters exposed for diagnostics and tests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub loads: u64,
    pub reclaimed: u64,
    pub entries: usize,
}

pub struct NodeCache<A: Action> {
    slots: RwLock<HashMap<String, Slot<A>>>,
    /// Entry count above which unreferenced nodes are reclaimed; 0 disables reclamation
    capacity: usize,
    hits: AtomicU64,
    loads: AtomicU64,
    reclaimed: AtomicU64,
}

impl<A: Action> NodeCache<A> {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
            capacity,
            hits: AtomicU64::new(0),
            loads: AtomicU64::new(0),
            reclaimed: AtomicU64::new(0),
        }
    }

    fn slot(&self, id: &str) -> Slot<A> {
        {
            let slots = self.slots.read();
            if let Some(slot) = slots.get(id) {
                return slot.clone();
            }
        }

        let mut slots = self.slots.write();
        // Another thread may have created it between the two locks
        slots
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(None)))
            .clone()
    }

    /// Return the cached node for `id`, running `load` on a miss.
    pub fn get_or_load<F>(&self, id: &str, load: F) -> Result<Arc<FlowNode<A>>, StorageError>
    where
        F: FnOnce() -> Result<Arc<FlowNode<A>>, StorageError>,
    {
        let slot = self.slot(id);
        let mut guard = slot.lock();
        if let Some(node) = guard.as_ref() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(node.clone());
        }

        self.loads.fetch_add(1, Ordering::Relaxed);
        match load() {
            Ok(node) => {
                *guard = Some(node.clone());
                drop(guard);
                self.reclaim_over_capacity();
                Ok(node)
            }
            Err(err) => {
                drop(guard);
                self.discard_empty(id, &slot);
                Err(err)
            }
        }
    }

    /// Cached node for `id`, never touching disk.
    pub fn peek(&self, id: &str) -> Option<Arc<FlowNode<A>>> {
        let slot = self.slots.read().get(id).cloned()?;
        let node = slot.lock().clone();
        node
    }

    /// Write-through refresh after a node was persisted.
    pub fn insert(&self, node: Arc<FlowNode<A>>) {
        let slot = self.slot(node.id());
        *slot.lock() = Some(node);
        self.reclaim_over_capacity();
    }

    /// Drop every entry no caller holds. Returns how many were dropped.
    pub fn reclaim(&self) -> usize {
        let mut slots = self.slots.write();
        let before = slots.len();
        slots.retain(|_, slot| {
            if Arc::strong_count(slot) > 1 {
                return true;
            }
            match slot.try_lock() {
                Some(entry) => entry.as_ref().is_some_and(|node| Arc::strong_count(node) > 1),
                // A loader holds the slot
                None => true,
            }
        });
        let dropped = before - slots.len();
        self.reclaimed.fetch_add(dropped as u64, Ordering::Relaxed);
        dropped
    }

    fn reclaim_over_capacity(&self) {
        if self.capacity > 0 && self.len() > self.capacity {
            let dropped = self.reclaim();
            tracing::debug!(dropped, capacity = self.capacity, "Reclaimed flow node cache entries");
        }
    }

    /// Remove a slot left empty by a failed load, unless someone else is waiting on it.
    fn discard_empty(&self, id: &str, slot: &Slot<A>) {
        let mut slots = self.slots.write();
        let remove = match slots.get(id) {
            Some(existing) if Arc::ptr_eq(existing, slot) && Arc::strong_count(existing) == 2 => {
                existing.try_lock().is_some_and(|entry| entry.is_none())
            }
            _ => false,
        };
        if remove {
            slots.remove(id);
        }
    }

    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            loads: self.loads.load(Ordering::Relaxed),
            reclaimed: self.reclaimed.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }
}
