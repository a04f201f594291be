// src/runtime/registry.rs
//! Loader registry
//!
//! Maps a file extension (with its leading dot) to the loader that evaluates
//! files of that type. There is exactly one loader per extension; swapping a
//! loader out is done through `replace`/`restore` pairs, normally via
//! `interception::LoaderGuard`.

use crate::runtime::host::Runtime;
use crate::runtime::module::Module;
use crate::utils::errors::{HarnessError, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Loader function signature
pub type LoaderFn = dyn Fn(&Runtime, &mut Module) -> Result<()> + Send + Sync;

/// A named loader
#[derive(Clone)]
pub struct Loader {
    name: Arc<str>,
    func: Arc<LoaderFn>,
}

impl Loader {
    pub fn new<F>(name: impl AsRef<str>, func: F) -> Self
    where
        F: Fn(&Runtime, &mut Module) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            name: Arc::from(name.as_ref()),
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Evaluate `module` with this loader
    pub fn load(&self, runtime: &Runtime, module: &mut Module) -> Result<()> {
        (self.func)(runtime, module)
    }

    /// Whether both handles refer to the same loader instance
    pub fn same_as(&self, other: &Loader) -> bool {
        Arc::ptr_eq(&self.func, &other.func)
    }
}

impl fmt::Debug for Loader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Loader({})", self.name)
    }
}

/// Extension → loader table
#[derive(Default)]
pub struct LoaderRegistry {
    loaders: RwLock<HashMap<String, Loader>>,
}

impl LoaderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loader currently active for an extension
    pub fn get(&self, extension: &str) -> Option<Loader> {
        self.loaders.read().get(extension).cloned()
    }

    /// Registered extensions, sorted
    pub fn extensions(&self) -> Vec<String> {
        let mut extensions: Vec<String> = self.loaders.read().keys().cloned().collect();
        extensions.sort();
        extensions
    }

    /// Install `loader`, returning the loader that was active
    pub fn replace(&self, extension: &str, loader: Loader) -> Option<Loader> {
        debug!("Installing loader {} for {}", loader.name(), extension);
        self.loaders.write().insert(extension.to_string(), loader)
    }

    /// Build a loader from the active one and install it in a single step
    ///
    /// Fails without touching the registry when no loader is active.
    pub fn replace_with<F>(&self, extension: &str, build: F) -> Result<Loader>
    where
        F: FnOnce(Loader) -> Loader,
    {
        let mut loaders = self.loaders.write();
        let previous = loaders
            .get(extension)
            .cloned()
            .ok_or_else(|| HarnessError::NoLoader {
                extension: extension.to_string(),
            })?;

        let loader = build(previous.clone());
        debug!(
            "Installing loader {} over {} for {}",
            loader.name(),
            previous.name(),
            extension
        );
        loaders.insert(extension.to_string(), loader);

        Ok(previous)
    }

    /// Reinstall a loader returned by `replace`; `None` removes the entry
    pub fn restore(&self, extension: &str, previous: Option<Loader>) {
        let mut loaders = self.loaders.write();
        match previous {
            Some(loader) => {
                debug!("Restoring loader {} for {}", loader.name(), extension);
                loaders.insert(extension.to_string(), loader);
            }
            None => {
                debug!("Removing loader for {}", extension);
                loaders.remove(extension);
            }
        }
    }

    /// Whether `loader` is the one active for an extension
    pub fn is_active(&self, extension: &str, loader: &Loader) -> bool {
        self.loaders
            .read()
            .get(extension)
            .map(|active| active.same_as(loader))
            .unwrap_or(false)
    }
}
