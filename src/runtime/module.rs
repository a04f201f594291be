// src/runtime/module.rs
//! Module records and the scope injected into module code
//!
//! A `Module` is created for every file the runtime evaluates. Loaders may
//! rebind its resolver, detach it from its parent or intercept its compile
//! step before the script runs. Script code only sees the module through
//! `ModuleScope`, which is the capabilities object handed to every module body.

use crate::runtime::cache::CachedModule;
use crate::runtime::host::Runtime;
use crate::runtime::resolver::{ModuleRequire, Resolve};
use crate::runtime::source::Script;
use crate::runtime::value::{ObjectLike, Value};
use crate::utils::errors::Result;
use crate::utils::paths::dirname;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One-shot replacement for a module's compile step
pub type CompileHook = Box<dyn FnOnce(&Runtime, &mut Module, Script) -> Result<()> + Send>;

/// A module being loaded
pub struct Module {
    filename: PathBuf,

    /// Requiring module, `None` when run as the entry point
    pub parent: Option<PathBuf>,

    /// Resolver backing this module's `require`
    pub require: Arc<dyn Resolve>,

    compile_hook: Option<CompileHook>,
    cached: CachedModule,
}

impl Module {
    pub fn new(filename: PathBuf, parent: Option<PathBuf>) -> Self {
        Self {
            require: Arc::new(ModuleRequire::new(filename.clone())),
            filename,
            parent,
            compile_hook: None,
            cached: CachedModule::new(),
        }
    }

    pub fn filename(&self) -> &Path {
        &self.filename
    }

    pub fn exports(&self) -> Value {
        self.cached.exports()
    }

    pub fn set_exports(&self, exports: Value) {
        self.cached.set_exports(exports);
    }

    /// Cache handle sharing this module's exports
    pub fn cached(&self) -> CachedModule {
        self.cached.clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.cached.is_loaded()
    }

    pub(crate) fn mark_loaded(&self) {
        self.cached.mark_loaded();
    }

    /// Replace the next compile step of this module
    ///
    /// The hook is removed before it runs, so calling `compile` from inside it
    /// reaches the original compile step.
    pub fn intercept_compile<F>(&mut self, hook: F)
    where
        F: FnOnce(&Runtime, &mut Module, Script) -> Result<()> + Send + 'static,
    {
        self.compile_hook = Some(Box::new(hook));
    }

    /// Evaluate a script as this module's top-level code
    pub fn compile(&mut self, runtime: &Runtime, script: Script) -> Result<()> {
        if let Some(hook) = self.compile_hook.take() {
            return hook(runtime, self, script);
        }

        let mut scope = ModuleScope::new(runtime, self);
        script.run(&mut scope)
    }
}

/// Capabilities handed to module code
pub struct ModuleScope<'a> {
    runtime: &'a Runtime,
    module: &'a mut Module,
    shadowed: BTreeMap<String, Value>,
}

impl<'a> ModuleScope<'a> {
    pub fn new(runtime: &'a Runtime, module: &'a mut Module) -> Self {
        Self {
            runtime,
            module,
            shadowed: BTreeMap::new(),
        }
    }

    pub fn runtime(&self) -> &'a Runtime {
        self.runtime
    }

    /// Resolve and load a dependency through this module's resolver
    pub fn require(&mut self, specifier: &str) -> Result<Value> {
        let resolver = Arc::clone(&self.module.require);
        resolver.require(self.runtime, specifier)
    }

    /// Read a global binding, honouring any shadowing in effect
    pub fn global(&self, name: &str) -> Value {
        match self.shadowed.get(name) {
            Some(value) => value.clone(),
            None => self.runtime.global(name),
        }
    }

    /// Run `body` with `bindings` shadowing the globals of the same name
    pub fn with_shadowed_globals<F>(&mut self, bindings: BTreeMap<String, Value>, body: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        let mut shadowed = self.shadowed.clone();
        shadowed.extend(bindings);
        let saved = std::mem::replace(&mut self.shadowed, shadowed);

        let result = body(self);

        self.shadowed = saved;
        result
    }

    pub fn exports(&self) -> Value {
        self.module.exports()
    }

    /// Replace the exported value
    pub fn set_exports(&mut self, exports: impl Into<Value>) {
        self.module.set_exports(exports.into());
    }

    /// Set a member on the exports object
    pub fn export(&mut self, name: &str, value: impl Into<Value>) {
        match self.module.exports() {
            Value::Object(object) => object.set(name, value.into()),
            _ => {
                let object = Value::object();
                if let Value::Object(handle) = &object {
                    handle.set(name, value.into());
                }
                self.module.set_exports(object);
            }
        }
    }

    pub fn filename(&self) -> &Path {
        self.module.filename()
    }

    pub fn dirname(&self) -> PathBuf {
        dirname(self.module.filename())
    }

    pub fn parent(&self) -> Option<&Path> {
        self.module.parent.as_deref()
    }

    /// Whether this module runs as the entry point rather than being required
    pub fn is_main(&self) -> bool {
        self.module.parent.is_none()
    }
}
