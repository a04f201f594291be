// src/lib.rs
//! Adapter Harness Library
//!
//! Loads a plugin module ("adapter") into a module runtime while
//! controlling how it resolves its dependencies, which global bindings it
//! sees and how the runtime loads files, so plugin startup code can run in
//! tests without a real host and without escaping (e.g. by exiting the
//! process).
//!
//! # Architecture
//!
//! The library is structured into several key modules:
//!
//! - **runtime**: module runtime, loader registry, module cache, values
//! - **interception**: global proxies, mock resolver, patcher, loader guard, fake exit
//! - **harness**: the load orchestrator and plugin startup
//! - **observability**: logging setup and metric names
//! - **utils**: errors, configuration and path helpers

// Public module exports
pub mod harness;
pub mod interception;
pub mod observability;
pub mod runtime;
pub mod utils;

// Re-export commonly used types
pub use harness::{load_module_in_harness, start_plugin, HarnessOptions, PluginRun, StartOptions};
pub use interception::{fake_process_exit, GlobalPatches, GlobalProxy, MockModule, MockModules};
pub use runtime::{MemorySources, ModuleScope, Runtime, Value};
pub use utils::config::HarnessSettings;
pub use utils::errors::{HarnessError, Result};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
