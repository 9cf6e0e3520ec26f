//! Concurrent pack cache with load-once-per-key semantics

use crate::model::{PackKey, SchemaPack};
use crate::Result;
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use std::sync::Arc;
use tracing::trace;

type Slot = Arc<OnceCell<Arc<SchemaPack>>>;

/// Process-wide cache of parsed packs.
///
/// Each key owns a [`OnceCell`]. The map shard lock is held only long enough
/// to fetch or create the cell, so loading one pack never blocks lookups of
/// another. Concurrent first lookups of the same key wait on the same cell
/// and the loader runs once. A failed load leaves the cell empty so the next
/// lookup tries again.
#[derive(Debug, Default)]
pub struct PackRegistry {
    slots: DashMap<PackKey, Slot>,
}

impl PackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached pack for `key`, running `load` if it is absent.
    pub fn get_or_try_load<F>(&self, key: &PackKey, load: F) -> Result<Arc<SchemaPack>>
    where
        F: FnOnce() -> Result<SchemaPack>,
    {
        let slot = self.slot(key);
        let pack = slot.get_or_try_init(|| {
            trace!("Populating pack cache for {}", key);
            load().map(Arc::new)
        })?;
        Ok(Arc::clone(pack))
    }

    /// Insert a pre-built pack, replacing any cached one.
    pub fn register(&self, pack: SchemaPack) {
        let cell = OnceCell::new();
        let key = pack.key();
        let _ = cell.set(Arc::new(pack));
        self.slots.insert(key, Arc::new(cell));
    }

    /// Cached pack for `key`, if loaded.
    pub fn get(&self, key: &PackKey) -> Option<Arc<SchemaPack>> {
        self.slots
            .get(key)
            .and_then(|slot| slot.get().map(Arc::clone))
    }

    pub fn contains(&self, key: &PackKey) -> bool {
        self.get(key).is_some()
    }

    /// Keys of successfully loaded packs, sorted.
    pub fn keys(&self) -> Vec<PackKey> {
        let mut keys: Vec<PackKey> = self
            .slots
            .iter()
            .filter(|entry| entry.value().get().is_some())
            .map(|entry| entry.key().clone())
            .collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.keys().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, key: &PackKey) -> Slot {
        if let Some(existing) = self.slots.get(key) {
            return Arc::clone(existing.value());
        }
        Arc::clone(self.slots.entry(key.clone()).or_default().value())
    }
}
