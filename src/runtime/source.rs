// src/runtime/source.rs
//! Module sources
//!
//! A source tree maps file paths to module sources. Scripts are native
//! closures evaluated against a `ModuleScope`; text sources hold data such as
//! JSON. The in-memory tree can fall back to reading text from disk.

use crate::runtime::module::ModuleScope;
use crate::utils::config::RuntimeSettings;
use crate::utils::errors::{HarnessError, Result};
use crate::utils::paths::normalize;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Body of an executable module
pub type ScriptBody = dyn Fn(&mut ModuleScope<'_>) -> Result<()> + Send + Sync;

/// Executable module code
#[derive(Clone)]
pub struct Script {
    body: Arc<ScriptBody>,
}

impl Script {
    pub fn new<F>(body: F) -> Self
    where
        F: Fn(&mut ModuleScope<'_>) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            body: Arc::new(body),
        }
    }

    /// Evaluate the script's top-level code
    pub fn run(&self, scope: &mut ModuleScope<'_>) -> Result<()> {
        (self.body)(scope)
    }
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Script")
    }
}

/// Contents of a module file
#[derive(Debug, Clone)]
pub enum Source {
    Script(Script),
    Text(String),
}

/// Read access to module files
pub trait SourceTree: Send + Sync {
    /// Read the source stored at an exact (normalized) path
    fn read(&self, path: &Path) -> Result<Source>;

    /// Whether a source exists at an exact path
    fn exists(&self, path: &Path) -> bool;

    /// Entry file of an installed package, for bare specifiers
    fn resolve_package(&self, _name: &str) -> Option<PathBuf> {
        None
    }
}

/// In-memory source tree with optional disk fallback for text files
#[derive(Default)]
pub struct MemorySources {
    files: RwLock<HashMap<PathBuf, Source>>,
    packages: RwLock<HashMap<String, PathBuf>>,
    disk_fallback: bool,
}

impl MemorySources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Source tree configured from runtime settings
    pub fn from_settings(settings: &RuntimeSettings) -> Self {
        Self::new().with_disk_fallback(settings.disk_fallback)
    }

    /// Read paths that are not registered from disk
    pub fn with_disk_fallback(mut self, enabled: bool) -> Self {
        self.disk_fallback = enabled;
        self
    }

    /// Register a script at a path
    pub fn add_script<F>(&self, path: impl AsRef<Path>, body: F)
    where
        F: Fn(&mut ModuleScope<'_>) -> Result<()> + Send + Sync + 'static,
    {
        self.insert(path, Source::Script(Script::new(body)));
    }

    /// Register a text file at a path
    pub fn add_text(&self, path: impl AsRef<Path>, text: impl Into<String>) {
        self.insert(path, Source::Text(text.into()));
    }

    pub fn insert(&self, path: impl AsRef<Path>, source: Source) {
        let path = normalize(path);
        debug!("Registering source {}", path.display());
        self.files.write().insert(path, source);
    }

    pub fn remove(&self, path: impl AsRef<Path>) -> bool {
        self.files.write().remove(&normalize(path)).is_some()
    }

    /// Make a bare specifier resolve to an entry file
    pub fn add_package(&self, name: impl Into<String>, entry: impl AsRef<Path>) {
        self.packages
            .write()
            .insert(name.into(), normalize(entry));
    }
}

impl SourceTree for MemorySources {
    fn read(&self, path: &Path) -> Result<Source> {
        if let Some(source) = self.files.read().get(path) {
            return Ok(source.clone());
        }

        if self.disk_fallback && path.is_file() {
            debug!("Reading {} from disk", path.display());
            return Ok(Source::Text(std::fs::read_to_string(path)?));
        }

        Err(HarnessError::ModuleNotFound {
            specifier: path.display().to_string(),
            from: None,
        })
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.read().contains_key(path) || (self.disk_fallback && path.is_file())
    }

    fn resolve_package(&self, name: &str) -> Option<PathBuf> {
        self.packages.read().get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_registered_sources() {
        let sources = MemorySources::new();
        sources.add_text("/plugin/./io-package.json", "{}");
        sources.add_script("/plugin/main.js", |_| Ok(()));

        assert!(sources.exists(Path::new("/plugin/io-package.json")));
        assert!(matches!(
            sources.read(Path::new("/plugin/main.js")).unwrap(),
            Source::Script(_)
        ));
        assert!(sources.remove("/plugin/main.js"));
        assert!(!sources.exists(Path::new("/plugin/main.js")));
    }

    #[test]
    fn test_missing_source() {
        let sources = MemorySources::new();
        let err = sources.read(Path::new("/nowhere.js")).unwrap_err();
        assert!(err.is_module_not_found());
    }

    #[test]
    fn test_disk_fallback() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, "{{\"common\": {{\"name\": \"demo\"}}}}").unwrap();

        let without = MemorySources::from_settings(&RuntimeSettings {
            disk_fallback: false,
            ..RuntimeSettings::default()
        });
        assert!(!without.exists(file.path()));

        let with = MemorySources::from_settings(&RuntimeSettings::default());
        assert!(with.exists(file.path()));
        match with.read(file.path()).unwrap() {
            Source::Text(text) => assert!(text.contains("demo")),
            Source::Script(_) => panic!("expected text source"),
        }
    }

    #[test]
    fn test_packages() {
        let sources = MemorySources::new();
        sources.add_package("@plugin/core", "/node_modules/@plugin/core/index.js");
        assert_eq!(
            sources.resolve_package("@plugin/core"),
            Some(PathBuf::from("/node_modules/@plugin/core/index.js"))
        );
        assert_eq!(sources.resolve_package("missing"), None);
    }
}
