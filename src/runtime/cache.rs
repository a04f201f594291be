// src/runtime/cache.rs
//! Module cache keyed by normalized filename
//!
//! Entries are inserted before a module's code runs so that require cycles
//! observe the partially populated exports.

use crate::runtime::value::Value;
use crate::utils::paths::normalize;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Shared exports cell of a module
#[derive(Clone)]
pub struct CachedModule {
    exports: Arc<RwLock<Value>>,
    loaded: Arc<AtomicBool>,
}

impl CachedModule {
    pub fn new() -> Self {
        Self {
            exports: Arc::new(RwLock::new(Value::object())),
            loaded: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn exports(&self) -> Value {
        self.exports.read().clone()
    }

    pub fn set_exports(&self, exports: Value) {
        *self.exports.write() = exports;
    }

    /// Whether the module's top-level code has finished
    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    pub(crate) fn mark_loaded(&self) {
        self.loaded.store(true, Ordering::Release);
    }
}

impl Default for CachedModule {
    fn default() -> Self {
        Self::new()
    }
}

/// Runtime-wide module cache
#[derive(Default)]
pub struct ModuleCache {
    entries: DashMap<PathBuf, CachedModule>,
}

impl ModuleCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, filename: &Path) -> Option<CachedModule> {
        self.entries
            .get(&normalize(filename))
            .map(|entry| entry.value().clone())
    }

    pub fn contains(&self, filename: &Path) -> bool {
        self.entries.contains_key(&normalize(filename))
    }

    pub fn insert(&self, filename: &Path, module: CachedModule) {
        self.entries.insert(normalize(filename), module);
    }

    /// Remove an entry so the next load evaluates the file again
    pub fn evict(&self, filename: &Path) -> bool {
        let evicted = self.entries.remove(&normalize(filename)).is_some();
        if evicted {
            debug!("Evicted {} from module cache", filename.display());
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_evict() {
        let cache = ModuleCache::new();
        let module = CachedModule::new();
        module.set_exports(Value::from("exported"));

        cache.insert(Path::new("/plugin/lib/../main.js"), module);
        assert!(cache.contains(Path::new("/plugin/main.js")));
        assert_eq!(
            cache.get(Path::new("/plugin/main.js")).unwrap().exports().as_str(),
            Some("exported")
        );

        assert!(cache.evict(Path::new("/plugin/./main.js")));
        assert!(!cache.evict(Path::new("/plugin/main.js")));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_shared_exports_cell() {
        let module = CachedModule::new();
        let handle = module.clone();
        handle.set_exports(Value::from(42));
        handle.mark_loaded();

        assert_eq!(module.exports(), Value::from(42));
        assert!(module.is_loaded());
    }
}
