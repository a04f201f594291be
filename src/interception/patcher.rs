// src/interception/patcher.rs
//! Global patcher
//!
//! Turns a module's script into one that runs the original body with the
//! patched globals shadowed by proxies. The wrapper takes one binding per
//! patched global name, each a fresh `GlobalProxy` over the runtime's real
//! global, and every `scope.global(name)` read inside the unchanged body
//! resolves through that binding.
//!
//! ```text
//! patched(scope) = (|process, ...| original(scope))(proxy(process, overrides), ...)
//! ```

use crate::interception::exit_signal::{fake_process_exit, EXIT_MEMBER};
use crate::interception::global_proxy::{GlobalProxy, Overrides};
use crate::runtime::source::Script;
use crate::runtime::value::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::trace;

/// Global name → member overrides
#[derive(Debug, Clone, Default)]
pub struct GlobalPatches {
    globals: BTreeMap<String, Arc<Overrides>>,
}

impl GlobalPatches {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override `member` of the global `global`
    pub fn patch(mut self, global: &str, member: &str, value: impl Into<Value>) -> Self {
        self.insert(global, member, value.into());
        self
    }

    pub fn insert(&mut self, global: &str, member: &str, value: Value) {
        let overrides = self.globals.entry(global.to_string()).or_default();
        Arc::make_mut(overrides).insert(member.to_string(), value);
    }

    /// Redirect `process.exit` into the fake termination signal
    pub fn with_fake_process_exit(self) -> Self {
        self.patch("process", EXIT_MEMBER, fake_process_exit())
    }

    /// Patched global names, in binding order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.globals.keys().map(String::as_str)
    }

    pub fn overrides(&self, global: &str) -> Option<&Overrides> {
        self.globals.get(global).map(|o| o.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.globals.is_empty()
    }

    /// Add every override of `other`, replacing clashing members
    pub fn merge(&mut self, other: &GlobalPatches) {
        for (global, overrides) in &other.globals {
            for (member, value) in overrides.iter() {
                self.insert(global, member, value.clone());
            }
        }
    }
}

/// Wrap `script` so the globals named in `patches` read through proxies
pub fn patch_globals(script: Script, patches: &GlobalPatches) -> Script {
    let patches = patches.clone();

    Script::new(move |scope| {
        let mut bindings = BTreeMap::new();
        for (name, overrides) in &patches.globals {
            let real = scope.runtime().global(name);
            let proxy = GlobalProxy::wrap(name, real, Arc::clone(overrides))?;
            bindings.insert(name.clone(), proxy);
        }

        trace!(
            "Evaluating {} with patched globals: {}",
            scope.filename().display(),
            patches.names().collect::<Vec<_>>().join(", ")
        );
        scope.with_shadowed_globals(bindings, |scope| script.run(scope))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::host::Runtime;
    use crate::runtime::module::Module;
    use crate::runtime::source::MemorySources;
    use crate::runtime::value::{ObjectLike, PlainObject};
    use crate::utils::errors::HarnessError;
    use std::path::PathBuf;

    fn evaluate(runtime: &Runtime, script: Script) -> crate::utils::errors::Result<Value> {
        let mut module = Module::new(PathBuf::from("/plugin/main.js"), None);
        module.compile(runtime, script)?;
        Ok(module.exports())
    }

    /// Reads a few members of `process` and `console` into its exports
    fn probe() -> Script {
        Script::new(|scope| {
            let process = scope.global("process");
            scope.export("exit_type", process.get("exit").type_of());
            scope.export("platform", process.get("platform"));
            scope.export("console_type", scope.global("console").type_of());
            scope.export("exit_result", match process.call_method("exit", &[Value::from(5)]) {
                Err(HarnessError::ProcessExit { code }) => Value::from(code),
                other => Value::from(format!("{:?}", other.map(|_| ()))),
            });
            Ok(())
        })
    }

    fn runtime_with_fake_process() -> Runtime {
        let runtime = Runtime::new(Arc::new(MemorySources::new()));
        // keep the real exit out of reach in case patching fails
        let process = PlainObject::new()
            .with("platform", "testos")
            .with("exit", Value::function("exit", |_| Ok(Value::from("real exit"))));
        runtime.set_global("process", Value::from_object(process));
        runtime
    }

    #[test]
    fn test_unpatched_script_sees_real_globals() {
        let runtime = runtime_with_fake_process();
        let exports = evaluate(&runtime, probe()).unwrap();
        assert_eq!(exports.get("exit_type").as_str(), Some("function"));
        assert_eq!(exports.get("exit_result").as_str(), Some("Ok(())"));
    }

    #[test]
    fn test_patched_member_is_redirected() {
        let runtime = runtime_with_fake_process();
        let patches = GlobalPatches::new().with_fake_process_exit();
        let exports = evaluate(&runtime, patch_globals(probe(), &patches)).unwrap();

        assert_eq!(exports.get("exit_type").as_str(), Some("function"));
        assert_eq!(exports.get("exit_result"), Value::from(5));
    }

    #[test]
    fn test_unlisted_members_and_globals_pass_through() {
        let runtime = runtime_with_fake_process();
        let patches = GlobalPatches::new().with_fake_process_exit();
        let exports = evaluate(&runtime, patch_globals(probe(), &patches)).unwrap();

        assert_eq!(exports.get("platform").as_str(), Some("testos"));
        assert_eq!(exports.get("console_type").as_str(), Some("object"));
    }

    #[test]
    fn test_shadowing_ends_with_the_script() {
        let runtime = runtime_with_fake_process();
        let patches = GlobalPatches::new().patch("process", "platform", "patched");

        let inner = Script::new(|scope| {
            let platform = scope.global("process").get("platform");
            scope.export("inside", platform);
            Ok(())
        });
        let outer = Script::new(move |scope| {
            patch_globals(inner.clone(), &patches).run(scope)?;
            let platform = scope.global("process").get("platform");
            scope.export("after", platform);
            Ok(())
        });

        let exports = evaluate(&runtime, outer).unwrap();
        assert_eq!(exports.get("inside").as_str(), Some("patched"));
        assert_eq!(exports.get("after").as_str(), Some("testos"));
        // the real global is untouched
        assert_eq!(
            runtime.global("process").as_object().unwrap().get("platform").as_str(),
            Some("testos")
        );
    }

    #[test]
    fn test_patching_a_missing_global_fails() {
        let runtime = runtime_with_fake_process();
        let patches = GlobalPatches::new().patch("window", "alert", Value::Null);
        let err = evaluate(&runtime, patch_globals(probe(), &patches)).unwrap_err();
        assert!(matches!(err, HarnessError::ProxyTarget { .. }));
    }

    #[test]
    fn test_merge() {
        let mut patches = GlobalPatches::new().patch("process", "exit", 1);
        patches.merge(&GlobalPatches::new().patch("process", "exit", 2).patch("os", "type", "x"));

        assert_eq!(patches.names().collect::<Vec<_>>(), vec!["os", "process"]);
        assert_eq!(patches.overrides("process").unwrap()["exit"], Value::from(2));
    }
}
