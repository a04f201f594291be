// src/runtime/resolver.rs
//! Dependency resolution
//!
//! Every module owns a resolver behind its `require`. The runtime installs a
//! `ModuleRequire` bound to the module's own file; the harness may wrap it in
//! a mock resolver for the duration of a load.

use crate::runtime::host::Runtime;
use crate::runtime::value::Value;
use crate::utils::errors::Result;
use std::path::{Path, PathBuf};

/// Resolves a specifier to a module's exports
pub trait Resolve: Send + Sync {
    fn require(&self, runtime: &Runtime, specifier: &str) -> Result<Value>;
}

impl<F> Resolve for F
where
    F: Fn(&Runtime, &str) -> Result<Value> + Send + Sync,
{
    fn require(&self, runtime: &Runtime, specifier: &str) -> Result<Value> {
        self(runtime, specifier)
    }
}

/// Source-tree backed resolver bound to a requiring module
#[derive(Debug, Clone)]
pub struct ModuleRequire {
    from: PathBuf,
}

impl ModuleRequire {
    pub fn new(from: PathBuf) -> Self {
        Self { from }
    }

    /// File the resolver resolves relative specifiers against
    pub fn from(&self) -> &Path {
        &self.from
    }
}

impl Resolve for ModuleRequire {
    fn require(&self, runtime: &Runtime, specifier: &str) -> Result<Value> {
        let filename = runtime.resolve_filename(specifier, Some(&self.from))?;
        runtime.load(&filename, Some(&self.from))
    }
}
