// src/utils/errors.rs
//! Error types shared by the runtime, the interception layer and the harness

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, HarnessError>;

/// Errors raised while resolving, loading or evaluating modules
#[derive(Debug, Error)]
pub enum HarnessError {
    /// A specifier could not be resolved to a module
    #[error("Cannot find module '{specifier}'{}", .from.as_ref().map(|p| format!(" (required from {})", p.display())).unwrap_or_default())]
    ModuleNotFound {
        specifier: String,
        from: Option<PathBuf>,
    },

    /// Raised by the fake termination primitive instead of ending the process
    #[error("process.exit was called with code {code}")]
    ProcessExit { code: i32 },

    /// No loader is registered for a file extension
    #[error("No loader registered for extension '{extension}'")]
    NoLoader { extension: String },

    /// A text source was handed to the script loader
    #[error("Module {} is not an executable script", .filename.display())]
    NotExecutable { filename: PathBuf },

    /// A data module did not parse
    #[error("Failed to parse {}: {source}", .filename.display())]
    Json {
        filename: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A global patch targets a value that cannot be proxied
    #[error("Cannot patch global '{name}': expected an object, found {type_of}")]
    ProxyTarget { name: String, type_of: &'static str },

    #[error("Value of type {type_of} is not a function")]
    NotCallable { type_of: &'static str },

    /// Another harness load holds the loader slot
    #[error("A harness load is already in flight on this runtime")]
    HarnessBusy,

    #[error("Task result was already consumed")]
    TaskConsumed,

    #[error("Plugin startup did not finish within {0:?}")]
    StartupTimeout(Duration),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// An error thrown by module code
    #[error("{0}")]
    Thrown(String),

    #[error(transparent)]
    Script(#[from] anyhow::Error),
}

impl HarnessError {
    /// Build an error as thrown by module code
    pub fn thrown(message: impl Into<String>) -> Self {
        Self::Thrown(message.into())
    }

    /// Exit status carried by a fake termination signal, if this is one
    pub fn process_exit_code(&self) -> Option<i32> {
        match self {
            Self::ProcessExit { code } => Some(*code),
            _ => None,
        }
    }

    pub fn is_module_not_found(&self) -> bool {
        matches!(self, Self::ModuleNotFound { .. })
    }
}
