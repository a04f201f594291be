// src/runtime/host.rs
//! The module runtime
//!
//! `Runtime` plays the part of the host process: it owns the global scope,
//! the loader registry, the module cache and the source tree, and implements
//! the normal load path (resolve → cache lookup → loader dispatch).
//!
//! # Load path
//!
//! ```text
//! require(specifier)
//!     │
//!     ├─ resolve_filename ─→ normalized path (exact, then + extension)
//!     ├─ cache hit?       ─→ cached exports
//!     └─ Module::new → cache insert → loader[ext](module)
//!                                         │
//!                                         └─ script loader → Module::compile
//! ```
//!
//! The runtime is `Sync`, but loader swaps are runtime-wide: concurrent
//! harness loads on one runtime must be serialized by the caller.

use crate::runtime::cache::ModuleCache;
use crate::runtime::module::Module;
use crate::runtime::process::{console_object, process_object};
use crate::runtime::registry::{Loader, LoaderRegistry};
use crate::runtime::source::{MemorySources, Source, SourceTree};
use crate::runtime::value::Value;
use crate::utils::config::RuntimeSettings;
use crate::utils::errors::{HarnessError, Result};
use crate::utils::paths::{dirname, extension_of, is_relative_specifier, join, normalize};
use once_cell::sync::Lazy;
use parking_lot::{Mutex, MutexGuard, RwLock};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace};

/// Extension of data modules
pub const JSON_EXTENSION: &str = ".json";

/// File name standing in for the host when it requires a module
pub const HOST_MODULE: &str = "[host]";

static PROCESS_SOURCES: Lazy<Arc<MemorySources>> =
    Lazy::new(|| Arc::new(MemorySources::new().with_disk_fallback(true)));

static PROCESS_RUNTIME: Lazy<Runtime> = Lazy::new(|| {
    let sources: Arc<dyn SourceTree> = PROCESS_SOURCES.clone();
    Runtime::new(sources)
});

/// Module runtime
pub struct Runtime {
    cwd: PathBuf,
    script_extension: String,
    globals: RwLock<BTreeMap<String, Value>>,
    loaders: LoaderRegistry,
    cache: ModuleCache,
    sources: Arc<dyn SourceTree>,
    harness_slot: Mutex<()>,
}

impl Runtime {
    /// Create a runtime with default settings
    pub fn new(sources: Arc<dyn SourceTree>) -> Self {
        Self::with_settings(sources, &RuntimeSettings::default())
    }

    /// Create a runtime with the default globals and loaders installed
    pub fn with_settings(sources: Arc<dyn SourceTree>, settings: &RuntimeSettings) -> Self {
        let cwd = settings
            .cwd
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .map(normalize)
            .unwrap_or_else(|| PathBuf::from("/"));

        let runtime = Self {
            script_extension: settings.script_extension.clone(),
            globals: RwLock::new(BTreeMap::new()),
            loaders: LoaderRegistry::new(),
            cache: ModuleCache::new(),
            sources,
            harness_slot: Mutex::new(()),
            cwd,
        };

        runtime.set_global("process", Value::from_object(process_object(&runtime.cwd)));
        runtime.set_global("console", Value::from_object(console_object()));
        runtime.loaders.replace(&runtime.script_extension, script_loader());
        runtime.loaders.replace(JSON_EXTENSION, json_loader());

        runtime
    }

    /// Runtime shared by the whole process
    pub fn process_wide() -> &'static Runtime {
        &PROCESS_RUNTIME
    }

    /// Source tree backing `process_wide`
    pub fn process_wide_sources() -> &'static Arc<MemorySources> {
        &PROCESS_SOURCES
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn script_extension(&self) -> &str {
        &self.script_extension
    }

    pub fn loaders(&self) -> &LoaderRegistry {
        &self.loaders
    }

    pub fn cache(&self) -> &ModuleCache {
        &self.cache
    }

    pub fn sources(&self) -> &Arc<dyn SourceTree> {
        &self.sources
    }

    /// Read a global binding
    pub fn global(&self, name: &str) -> Value {
        self.globals.read().get(name).cloned().unwrap_or_default()
    }

    pub fn set_global(&self, name: &str, value: Value) -> Option<Value> {
        self.globals.write().insert(name.to_string(), value)
    }

    /// Path of the host pseudo-module, the parent of modules it requires
    pub fn host_path(&self) -> PathBuf {
        self.cwd.join(HOST_MODULE)
    }

    /// Resolve a specifier as seen from `from` (or from the working directory)
    pub fn resolve_filename(&self, specifier: &str, from: Option<&Path>) -> Result<PathBuf> {
        let not_found = || HarnessError::ModuleNotFound {
            specifier: specifier.to_string(),
            from: from.map(Path::to_path_buf),
        };

        let candidate = if is_relative_specifier(specifier) {
            let base = from.map(dirname).unwrap_or_else(|| self.cwd.clone());
            join(base, specifier)
        } else if Path::new(specifier).is_absolute() {
            normalize(specifier)
        } else {
            self.sources
                .resolve_package(specifier)
                .map(normalize)
                .ok_or_else(not_found)?
        };

        if self.sources.exists(&candidate) {
            trace!("Resolved {} to {}", specifier, candidate.display());
            return Ok(candidate);
        }

        for extension in self.loaders.extensions() {
            let mut with_extension = candidate.clone().into_os_string();
            with_extension.push(&extension);
            let with_extension = PathBuf::from(with_extension);

            if self.sources.exists(&with_extension) {
                trace!("Resolved {} to {}", specifier, with_extension.display());
                return Ok(with_extension);
            }
        }

        Err(not_found())
    }

    /// Load a resolved file, returning its exports
    ///
    /// Cached modules are returned without re-evaluation. A module whose
    /// loader fails is removed from the cache again.
    pub fn load(&self, filename: &Path, parent: Option<&Path>) -> Result<Value> {
        let filename = normalize(filename);

        if let Some(cached) = self.cache.get(&filename) {
            trace!("Cache hit for {}", filename.display());
            return Ok(cached.exports());
        }

        let extension = extension_of(&filename)
            .filter(|extension| self.loaders.get(extension).is_some())
            .unwrap_or_else(|| self.script_extension.clone());
        let loader = self
            .loaders
            .get(&extension)
            .ok_or_else(|| HarnessError::NoLoader {
                extension: extension.clone(),
            })?;

        let mut module = Module::new(filename.clone(), parent.map(Path::to_path_buf));
        self.cache.insert(&filename, module.cached());

        debug!("Loading {} with loader {}", filename.display(), loader.name());
        match loader.load(self, &mut module) {
            Ok(()) => {
                module.mark_loaded();
                Ok(module.exports())
            }
            Err(e) => {
                self.cache.evict(&filename);
                Err(e)
            }
        }
    }

    /// Require a module on behalf of the host
    pub fn require(&self, specifier: &str) -> Result<Value> {
        let host = self.host_path();
        let filename = self.resolve_filename(specifier, Some(&host))?;
        self.load(&filename, Some(&host))
    }

    /// Run a module as the entry point, without a parent
    pub fn run_main(&self, specifier: &str) -> Result<Value> {
        let host = self.host_path();
        let filename = self.resolve_filename(specifier, Some(&host))?;
        self.load(&filename, None)
    }

    /// Claim the runtime's single harness slot
    pub(crate) fn claim_harness_slot(&self) -> Result<MutexGuard<'_, ()>> {
        self.harness_slot.try_lock().ok_or(HarnessError::HarnessBusy)
    }
}

/// Loader evaluating script sources
pub fn script_loader() -> Loader {
    Loader::new("script", |runtime, module| {
        match runtime.sources().read(module.filename())? {
            Source::Script(script) => module.compile(runtime, script),
            Source::Text(_) => Err(HarnessError::NotExecutable {
                filename: module.filename().to_path_buf(),
            }),
        }
    })
}

/// Loader parsing JSON text into the module's exports
pub fn json_loader() -> Loader {
    Loader::new("json", |runtime, module| {
        let text = match runtime.sources().read(module.filename())? {
            Source::Text(text) => text,
            Source::Script(_) => {
                return Err(HarnessError::thrown(format!(
                    "{} is a script, not a data file",
                    module.filename().display()
                )))
            }
        };

        let json: serde_json::Value =
            serde_json::from_str(&text).map_err(|source| HarnessError::Json {
                filename: module.filename().to_path_buf(),
                source,
            })?;
        module.set_exports(Value::from_json(json));
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn runtime() -> (Arc<MemorySources>, Runtime) {
        let sources = Arc::new(MemorySources::new());
        let settings = RuntimeSettings {
            cwd: Some(PathBuf::from("/work")),
            ..RuntimeSettings::default()
        };
        let runtime = Runtime::with_settings(sources.clone(), &settings);
        (sources, runtime)
    }

    #[test]
    fn test_default_globals_and_loaders() {
        let (_, runtime) = runtime();
        assert_eq!(runtime.global("process").get("exit").type_of(), "function");
        assert_eq!(runtime.global("console").type_of(), "object");
        assert!(runtime.global("window").is_undefined());
        assert_eq!(runtime.loaders().extensions(), vec![".js", ".json"]);
    }

    #[test]
    fn test_resolve_filename() {
        let (sources, runtime) = runtime();
        sources.add_script("/plugin/lib/util.js", |_| Ok(()));
        sources.add_text("/plugin/io-package.json", "{}");
        sources.add_package("@plugin/core", "/node_modules/@plugin/core/index.js");
        sources.add_script("/node_modules/@plugin/core/index.js", |_| Ok(()));

        let from = Path::new("/plugin/main.js");
        assert_eq!(
            runtime.resolve_filename("./lib/util", Some(from)).unwrap(),
            PathBuf::from("/plugin/lib/util.js")
        );
        assert_eq!(
            runtime.resolve_filename("./io-package.json", Some(from)).unwrap(),
            PathBuf::from("/plugin/io-package.json")
        );
        assert_eq!(
            runtime.resolve_filename("@plugin/core", Some(from)).unwrap(),
            PathBuf::from("/node_modules/@plugin/core/index.js")
        );
        assert!(runtime
            .resolve_filename("./missing", Some(from))
            .unwrap_err()
            .is_module_not_found());
        assert!(runtime
            .resolve_filename("not-installed", None)
            .unwrap_err()
            .is_module_not_found());
    }

    #[test]
    fn test_require_caches_exports() {
        let (sources, runtime) = runtime();
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        sources.add_script("/work/counter.js", move |scope| {
            counter.fetch_add(1, Ordering::SeqCst);
            scope.export("name", "counter");
            Ok(())
        });

        let first = runtime.require("./counter").unwrap();
        let second = runtime.require("/work/counter.js").unwrap();
        assert_eq!(first.get("name").as_str(), Some("counter"));
        assert_eq!(first, second);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(runtime.cache().get(Path::new("/work/counter.js")).unwrap().is_loaded());
    }

    #[test]
    fn test_nested_require_relative_to_requirer() {
        let (sources, runtime) = runtime();
        sources.add_script("/plugin/main.js", |scope| {
            let util = scope.require("./lib/util")?;
            scope.set_exports(util.get("answer"));
            Ok(())
        });
        sources.add_script("/plugin/lib/util.js", |scope| {
            let config = scope.require("../config.json")?;
            scope.export("answer", config.get("answer"));
            Ok(())
        });
        sources.add_text("/plugin/config.json", r#"{"answer": 42}"#);

        assert_eq!(runtime.require("/plugin/main.js").unwrap(), Value::from(42));
    }

    #[test]
    fn test_require_cycle_sees_partial_exports() {
        let (sources, runtime) = runtime();
        sources.add_script("/cycle/a.js", |scope| {
            scope.export("early", true);
            let b = scope.require("./b")?;
            scope.export("b_saw_early", b.get("saw_early"));
            Ok(())
        });
        sources.add_script("/cycle/b.js", |scope| {
            let a = scope.require("./a")?;
            scope.export("saw_early", a.get("early"));
            Ok(())
        });

        let a = runtime.require("/cycle/a.js").unwrap();
        assert_eq!(a.get("b_saw_early"), Value::Bool(true));
    }

    #[test]
    fn test_failed_load_is_evicted() {
        let (sources, runtime) = runtime();
        sources.add_script("/work/broken.js", |_| Err(HarnessError::thrown("boom")));

        let err = runtime.require("./broken.js").unwrap_err();
        assert_eq!(err.to_string(), "boom");
        assert!(!runtime.cache().contains(Path::new("/work/broken.js")));
    }

    #[test]
    fn test_parent_tracking() {
        let (sources, runtime) = runtime();
        sources.add_script("/work/entry.js", |scope| {
            let is_main = scope.is_main();
            scope.export("is_main", is_main);
            Ok(())
        });

        let required = runtime.require("./entry.js").unwrap();
        assert_eq!(required.get("is_main"), Value::Bool(false));

        runtime.cache().evict(Path::new("/work/entry.js"));
        let main = runtime.run_main("./entry.js").unwrap();
        assert_eq!(main.get("is_main"), Value::Bool(true));
    }

    #[test]
    fn test_json_loader_errors() {
        let (sources, runtime) = runtime();
        sources.add_text("/work/bad.json", "{ not json");
        sources.add_text("/work/notes.js", "plain text");

        assert!(matches!(
            runtime.require("./bad.json").unwrap_err(),
            HarnessError::Json { .. }
        ));
        assert!(matches!(
            runtime.require("./notes.js").unwrap_err(),
            HarnessError::NotExecutable { .. }
        ));
    }

    #[test]
    fn test_harness_slot_is_exclusive() {
        let (_, runtime) = runtime();
        let slot = runtime.claim_harness_slot().unwrap();
        assert!(matches!(runtime.claim_harness_slot(), Err(HarnessError::HarnessBusy)));
        drop(slot);
        assert!(runtime.claim_harness_slot().is_ok());
    }

    #[test]
    fn test_process_wide_runtime() {
        Runtime::process_wide_sources().add_script("/process-wide/probe.js", |scope| {
            scope.set_exports("probe");
            Ok(())
        });
        let runtime = Runtime::process_wide();
        assert!(std::ptr::eq(runtime, Runtime::process_wide()));
        assert_eq!(
            runtime.require("/process-wide/probe.js").unwrap().as_str(),
            Some("probe")
        );
    }
}
