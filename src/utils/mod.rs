// src/utils/mod.rs
//! Common utilities: errors, configuration and path handling

pub mod config;
pub mod errors;
pub mod paths;

pub use config::{HarnessSettings, LogSettings, RuntimeSettings};
pub use errors::{HarnessError, Result};
