// src/harness/start.rs
//! Starting a plugin in the harness
//!
//! Runs a plugin's entry file the way a host would start it, but offline:
//! the entry believes it was started directly, `process.exit` is replaced by
//! the fake termination signal, and an exit request surfaces as
//! `PluginRun::process_exit_code` instead of ending the test process.
//! If the entry exports a pending `Task`, startup is awaited.

use crate::harness::loader::load_module_in_harness;
use crate::harness::options::HarnessOptions;
use crate::interception::mock_resolver::MockModules;
use crate::interception::patcher::GlobalPatches;
use crate::runtime::host::Runtime;
use crate::runtime::value::Value;
use crate::utils::errors::{HarnessError, Result};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Options for `start_plugin`
#[derive(Debug, Clone)]
pub struct StartOptions {
    /// Substitute modules for the plugin's dependencies
    pub mocked_modules: Option<MockModules>,

    /// Global overrides applied on top of the fake `process.exit`
    pub additional_global_patches: Option<GlobalPatches>,

    /// Make the entry believe it was started directly
    pub fake_not_required: bool,

    /// Upper bound for awaiting an exported startup task
    pub startup_timeout: Option<Duration>,
}

impl Default for StartOptions {
    fn default() -> Self {
        Self {
            mocked_modules: None,
            additional_global_patches: None,
            fake_not_required: true,
            startup_timeout: None,
        }
    }
}

impl StartOptions {
    /// Harness options for the entry load
    pub fn harness_options(&self) -> HarnessOptions {
        let mut patches = GlobalPatches::new().with_fake_process_exit();
        if let Some(additional) = &self.additional_global_patches {
            patches.merge(additional);
        }

        HarnessOptions {
            mocked_modules: self.mocked_modules.clone(),
            fake_not_required: self.fake_not_required,
            global_patches: Some(patches),
        }
    }
}

/// Outcome of starting a plugin
#[derive(Debug, Clone)]
pub struct PluginRun {
    /// Exports of the entry, or the resolved value of its startup task
    pub exports: Value,

    /// Status passed to `process.exit`, if the plugin called it
    pub process_exit_code: Option<i32>,
}

impl PluginRun {
    pub fn exited(&self) -> bool {
        self.process_exit_code.is_some()
    }
}

/// Start the plugin whose entry file is `main_file`
///
/// Fails with the plugin's error if startup fails for any reason other than
/// an exit request.
pub async fn start_plugin(
    runtime: &Runtime,
    main_file: impl AsRef<Path>,
    options: StartOptions,
) -> Result<PluginRun> {
    let main_file = main_file.as_ref();
    info!("Starting plugin {}", main_file.display());

    let loaded = load_module_in_harness(runtime, main_file, &options.harness_options());
    let exports = match capture_exit(loaded)? {
        Ok(exports) => exports,
        Err(run) => return Ok(run),
    };

    let task = match exports.as_task() {
        Some(task) => task.clone(),
        None => {
            return Ok(PluginRun {
                exports,
                process_exit_code: None,
            })
        }
    };

    debug!("Awaiting startup task of {}", main_file.display());
    let settled = match options.startup_timeout {
        Some(limit) => tokio::time::timeout(limit, task.wait())
            .await
            .map_err(|_| HarnessError::StartupTimeout(limit))?,
        None => task.wait().await,
    };

    Ok(match capture_exit(settled)? {
        Ok(value) => PluginRun {
            exports: value,
            process_exit_code: None,
        },
        Err(run) => run,
    })
}

/// Split an exit request off a result; other errors are returned as is
fn capture_exit(result: Result<Value>) -> Result<std::result::Result<Value, PluginRun>> {
    match result {
        Ok(value) => Ok(Ok(value)),
        Err(HarnessError::ProcessExit { code }) => {
            info!("Plugin requested exit with code {}", code);
            Ok(Err(PluginRun {
                exports: Value::Undefined,
                process_exit_code: Some(code),
            }))
        }
        Err(e) => Err(e),
    }
}
