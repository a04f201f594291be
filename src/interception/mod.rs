// src/interception/mod.rs
//! Interception layer
//!
//! This module provides the pieces the harness composes around a load:
//!
//! - **Global Proxy**: read-redirecting wrapper over a global object
//! - **Mock Resolver**: substitute modules in front of a real resolver
//! - **Patcher**: shadows named globals with proxies for one script
//! - **Loader Guard**: scoped replacement of a runtime-wide loader
//! - **Exit Signal**: catchable stand-in for `process.exit`
//!
//! # Architecture
//!
//! ```text
//! Plugin Code (Unmodified)
//!     │
//!     ├─ scope.require(id)    → Mock Resolver → mock exports | real resolver
//!     ├─ scope.global(name)   → Global Proxy  → override | real global
//!     └─ process.exit(code)   → Exit Signal   → Err(ProcessExit { code })
//! ```

pub mod exit_signal;
pub mod global_proxy;
pub mod loader_guard;
pub mod mock_resolver;
pub mod patcher;

// Re-export commonly used types
pub use exit_signal::{fake_process_exit, raise_process_exit};
pub use global_proxy::{GlobalProxy, Overrides};
pub use loader_guard::LoaderGuard;
pub use mock_resolver::{MockModule, MockModules, MockResolver};
pub use patcher::{patch_globals, GlobalPatches};
