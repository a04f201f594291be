// src/interception/loader_guard.rs
//! Scoped loader replacement
//!
//! `LoaderGuard` swaps the loader for one extension and puts the previous
//! loader back when it goes out of scope, whether the protected code returns,
//! fails with `?` or panics.

use crate::runtime::registry::{Loader, LoaderRegistry};
use crate::utils::errors::Result;
use tracing::debug;

/// Guard holding a replaced loader until release
#[must_use = "dropping the guard immediately restores the previous loader"]
pub struct LoaderGuard<'a> {
    registry: &'a LoaderRegistry,
    extension: String,
    previous: Option<Loader>,
}

impl<'a> LoaderGuard<'a> {
    /// Install `loader`, remembering whatever was active
    pub fn replace(registry: &'a LoaderRegistry, extension: &str, loader: Loader) -> Self {
        let previous = registry.replace(extension, loader);
        Self {
            registry,
            extension: extension.to_string(),
            previous,
        }
    }

    /// Install a loader built around the active one
    ///
    /// `build` receives the active loader so the new loader can delegate to it.
    pub fn install<F>(registry: &'a LoaderRegistry, extension: &str, build: F) -> Result<Self>
    where
        F: FnOnce(Loader) -> Loader,
    {
        let previous = registry.replace_with(extension, build)?;
        Ok(Self {
            registry,
            extension: extension.to_string(),
            previous: Some(previous),
        })
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Loader that will be restored
    pub fn previous(&self) -> Option<&Loader> {
        self.previous.as_ref()
    }

    /// Restore the previous loader now
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for LoaderGuard<'_> {
    fn drop(&mut self) {
        debug!("Releasing loader interception for {}", self.extension);
        self.registry.restore(&self.extension, self.previous.take());
    }
}
