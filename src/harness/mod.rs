// src/harness/mod.rs
//! Test harness
//!
//! - **Loader**: the orchestrator, `load_module_in_harness`
//! - **Options**: per-load configuration
//! - **Start**: offline plugin startup with exit-code capture
//!
//! # Example
//!
//! ```no_run
//! use adapter_harness::harness::{load_module_in_harness, HarnessOptions};
//! use adapter_harness::interception::fake_process_exit;
//! use adapter_harness::runtime::{MemorySources, Runtime};
//! use std::sync::Arc;
//!
//! let sources = Arc::new(MemorySources::new());
//! let runtime = Runtime::new(sources.clone());
//! sources.add_script("/plugin/main.js", |scope| {
//!     scope.global("process").call_method("exit", &[5.0.into()])?;
//!     Ok(())
//! });
//!
//! let options = HarnessOptions::new().patch("process", "exit", fake_process_exit());
//! let err = load_module_in_harness(&runtime, "/plugin/main.js", &options).unwrap_err();
//! assert_eq!(err.process_exit_code(), Some(5));
//! ```

pub mod loader;
pub mod options;
pub mod start;

// Re-export commonly used types
pub use loader::load_module_in_harness;
pub use options::HarnessOptions;
pub use start::{start_plugin, PluginRun, StartOptions};
