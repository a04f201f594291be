// src/harness/loader.rs
//! Harness orchestrator
//!
//! Loads one module with the runtime's script loader temporarily replaced by
//! an interception loader:
//!
//! 1. Resolve the target to a file
//! 2. Install the interception loader (scoped by `LoaderGuard`)
//! 3. Evict the target from the module cache
//! 4. Require the target through the normal load path
//! 5. Restore the previous loader, on success and on error alike
//! 6. Return the target's exports
//!
//! The interception loader applies to every module evaluated while it is
//! installed, so dependencies of the target get their own mock resolver,
//! scoped to their own directory, and their own patched globals.

use crate::harness::options::HarnessOptions;
use crate::interception::loader_guard::LoaderGuard;
use crate::interception::mock_resolver::MockResolver;
use crate::interception::patcher::patch_globals;
use crate::runtime::host::Runtime;
use crate::runtime::registry::Loader;
use crate::runtime::value::Value;
use crate::utils::errors::Result;
use crate::utils::paths::{normalize, same_module};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, info_span, warn};
use ulid::Ulid;

/// Load `module_filename` inside the harness and return its exports
///
/// The path should be absolute; relative paths resolve against the runtime's
/// working directory. Errors raised by the module propagate unchanged after
/// the loader has been restored.
pub fn load_module_in_harness(
    runtime: &Runtime,
    module_filename: impl AsRef<Path>,
    options: &HarnessOptions,
) -> Result<Value> {
    let requested = normalize(runtime.cwd().join(module_filename.as_ref()));
    let load_id = Ulid::new();
    let span = info_span!("harness_load", %load_id, target = %requested.display());
    let _entered = span.enter();

    let _slot = runtime.claim_harness_slot()?;
    metrics::counter!("harness_loads_total").increment(1);

    let result = load_target(runtime, &requested, options);

    if let Err(e) = &result {
        metrics::counter!("harness_load_failures_total").increment(1);
        match e.process_exit_code() {
            Some(code) => info!("{} requested exit with code {}", requested.display(), code),
            None => warn!("Harness load of {} failed: {}", requested.display(), e),
        }
    }

    result
}

fn load_target(runtime: &Runtime, requested: &Path, options: &HarnessOptions) -> Result<Value> {
    let target = runtime.resolve_filename(&requested.display().to_string(), None)?;

    let options = Arc::new(options.clone());
    let guard = LoaderGuard::install(runtime.loaders(), runtime.script_extension(), |previous| {
        interception_loader(previous, target.clone(), options)
    })?;

    if runtime.cache().evict(&target) {
        debug!("Evicted stale cache entry for {}", target.display());
    }

    info!("Loading {} in harness", target.display());
    let result = runtime.require(&target.display().to_string());

    guard.release();
    result
}

/// Build the loader installed for the duration of one harness load
fn interception_loader(previous: Loader, target: PathBuf, options: Arc<HarnessOptions>) -> Loader {
    Loader::new("harness", move |runtime, module| {
        if let Some(mocks) = &options.mocked_modules {
            let real = Arc::clone(&module.require);
            module.require = Arc::new(MockResolver::new(
                real,
                mocks.clone(),
                Some(module.filename()),
            ));
        }

        if options.fake_not_required && same_module(module.filename(), &target) {
            debug!("Detaching {} from its parent", module.filename().display());
            module.parent = None;
        }

        if let Some(patches) = &options.global_patches {
            let patches = patches.clone();
            module.intercept_compile(move |runtime, module, script| {
                // the hook has already been taken off the module, so this
                // reaches the original compile step
                module.compile(runtime, patch_globals(script, &patches))
            });
        }

        previous.load(runtime, module)
    })
}
