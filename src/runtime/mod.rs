// src/runtime/mod.rs
//! Module runtime
//!
//! This module provides the host environment plugin modules are loaded into:
//!
//! - **Host**: global scope, normal load path, default loaders
//! - **Registry**: extension → loader table (swapped by the harness)
//! - **Cache**: normalized path → module exports
//! - **Module**: module records and the `ModuleScope` capabilities object
//! - **Resolver**: the `Resolve` seam behind every module's `require`
//! - **Source**: source trees holding scripts and text files
//! - **Value**: dynamic values exchanged with module code
//! - **Process**: the default `process` and `console` globals
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────── Runtime ────────────────────────────┐
//! │  globals { process, console }                                   │
//! │                                                                 │
//! │  require ─→ resolve ─→ ModuleCache ─miss─→ LoaderRegistry[ext]  │
//! │                            ▲                     │              │
//! │                            │                     ▼              │
//! │                      exports cell ◀── Module::compile(Script)   │
//! │                                               │                 │
//! │                                               ▼                 │
//! │                                     ModuleScope (capabilities)  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod cache;
pub mod host;
pub mod module;
pub mod process;
pub mod registry;
pub mod resolver;
pub mod source;
pub mod value;

// Re-export commonly used types
pub use cache::{CachedModule, ModuleCache};
pub use host::{json_loader, script_loader, Runtime};
pub use module::{CompileHook, Module, ModuleScope};
pub use registry::{Loader, LoaderRegistry};
pub use resolver::{ModuleRequire, Resolve};
pub use source::{MemorySources, Script, Source, SourceTree};
pub use value::{Function, ObjectLike, ObjectRef, PlainObject, Task, Value};
