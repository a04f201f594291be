// src/interception/mock_resolver.rs
//! Mock dependency resolver
//!
//! Wraps a module's real resolver with a table of substitute modules.
//! Identifiers are matched by exact string equality after relative
//! specifiers have been joined onto the requiring module's directory;
//! no separator or case normalization happens beyond that.

use crate::runtime::host::Runtime;
use crate::runtime::resolver::Resolve;
use crate::runtime::value::Value;
use crate::utils::errors::Result;
use crate::utils::paths::{dirname, join};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace};

/// Substitute module record
#[derive(Debug, Clone)]
pub struct MockModule {
    pub exports: Value,
}

impl MockModule {
    pub fn new(exports: impl Into<Value>) -> Self {
        Self {
            exports: exports.into(),
        }
    }
}

/// Identifier → substitute module table
///
/// Cheap to clone; the table itself is shared.
#[derive(Debug, Clone, Default)]
pub struct MockModules {
    entries: Arc<BTreeMap<String, MockModule>>,
}

impl MockModules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a mock under an exact identifier
    pub fn with(mut self, id: impl Into<String>, exports: impl Into<Value>) -> Self {
        self.insert(id, MockModule::new(exports));
        self
    }

    pub fn insert(&mut self, id: impl Into<String>, module: MockModule) {
        Arc::make_mut(&mut self.entries).insert(id.into(), module);
    }

    pub fn get(&self, id: &str) -> Option<&MockModule> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add every entry of `other`, replacing entries with the same identifier
    pub fn merge(&mut self, other: &MockModules) {
        let entries = Arc::make_mut(&mut self.entries);
        for (id, module) in other.entries.iter() {
            entries.insert(id.clone(), module.clone());
        }
    }
}

/// Resolver answering from a mock table before falling back to a real resolver
pub struct MockResolver {
    real: Arc<dyn Resolve>,
    mocks: MockModules,
    relative_to_dir: Option<PathBuf>,
}

impl MockResolver {
    /// `relative_to` is the requiring file; without it relative specifiers
    /// reach the real resolver unresolved
    pub fn new(real: Arc<dyn Resolve>, mocks: MockModules, relative_to: Option<&Path>) -> Self {
        Self {
            real,
            mocks,
            relative_to_dir: relative_to.map(dirname),
        }
    }

    /// Identifier looked up in the mock table for `specifier`
    pub fn lookup_key(&self, specifier: &str) -> String {
        match &self.relative_to_dir {
            Some(dir) if specifier.starts_with('.') => join(dir, specifier).display().to_string(),
            _ => specifier.to_string(),
        }
    }
}

impl Resolve for MockResolver {
    fn require(&self, runtime: &Runtime, specifier: &str) -> Result<Value> {
        let id = self.lookup_key(specifier);

        if let Some(mock) = self.mocks.get(&id) {
            debug!("Resolved {} to mock module", id);
            metrics::counter!("harness_mock_hits_total").increment(1);
            return Ok(mock.exports.clone());
        }

        trace!("No mock for {}, delegating to real resolver", id);
        self.real.require(runtime, &id)
    }
}
