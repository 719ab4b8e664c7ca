//! Type-name → cleanup-method cache
//!
//! The only cross-unit mutable state in the engine. Read-mostly: after warm-up
//! nearly every lookup is a hit, so readers share the lock.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

#[derive(Debug, Default)]
pub struct CleanupCache {
    entries: RwLock<FxHashMap<String, Option<String>>>,
}

impl CleanupCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` on a miss; `Some(None)` when the type is known to have no cleanup
    pub fn get(&self, type_name: &str) -> Option<Option<String>> {
        self.entries.read().get(type_name).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn put(&self, type_name: impl Into<String>, method: Option<String>) {
        self.entries.write().insert(type_name.into(), method);
    }
}
