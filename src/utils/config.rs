// src/utils/config.rs
//! Harness configuration
//!
//! Settings are layered: built-in defaults, then an optional file, then
//! `ADAPTER_HARNESS__*` environment variables.

use crate::utils::errors::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "ADAPTER_HARNESS";

/// Top-level settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessSettings {
    /// Logging output
    pub log: LogSettings,

    /// Module runtime behaviour
    pub runtime: RuntimeSettings,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Filter directive, e.g. `info` or `adapter_harness=debug`
    pub level: String,

    /// Emit JSON lines instead of human-readable text
    pub json: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Module runtime settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeSettings {
    /// Directory relative specifiers resolve against when there is no requiring module
    pub cwd: Option<PathBuf>,

    /// Extension handled by the script loader (and intercepted by the harness)
    pub script_extension: String,

    /// Read unregistered paths from disk as text sources
    pub disk_fallback: bool,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            cwd: None,
            script_extension: ".js".to_string(),
            disk_fallback: true,
        }
    }
}

impl HarnessSettings {
    /// Load settings from `adapter-harness.{toml,json,yaml}` in the working directory, if present
    pub fn load() -> Result<Self> {
        Self::layered(
            config::File::with_name("adapter-harness").required(false),
            environment(),
        )
    }

    /// Load settings from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        Self::layered(config::File::from(path), environment())
    }

    /// Defaults, then `file`, then `env`
    fn layered<S>(file: S, env: config::Environment) -> Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let settings = config::Config::builder()
            .add_source(file)
            .add_source(env)
            .build()?
            .try_deserialize()?;

        Ok(settings)
    }
}

/// `ADAPTER_HARNESS__SECTION__KEY` overrides
fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX).separator("__")
}
