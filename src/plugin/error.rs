//! Error types for plugin orchestration.

use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;

use crate::plugin::command::Action;

/// Errors raised while resolving, discovering or installing plugins.
#[derive(Debug, Error)]
pub enum PluginError {
    /// Reference matched none of the candidate locations
    #[error("Input {0} cannot be resolved as a plugin")]
    UnresolvedReference(String),

    /// Reference resolved but holds no descriptor file
    #[error("No {descriptor} found under {}", root.display())]
    NoPluginUnits { root: PathBuf, descriptor: String },

    /// `rm` was called without any plugin names
    #[error("No plugin names given to remove")]
    NothingToRemove,

    /// The tool could not be started
    #[error("Failed to launch {}: {source}", program.display())]
    ToolSpawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The tool exited unsuccessfully
    #[error("plugman --{action} exited with {status}")]
    ToolFailed { action: Action, status: ExitStatus },

    /// The tool did not finish in time and was killed
    #[error("plugman --{action} timed out after {timeout:?}")]
    ToolTimeout {
        action: Action,
        timeout: Duration,
        stdout: String,
        stderr: String,
    },

    /// Advisory lock on a plugin root could not be taken
    #[error("Failed to lock {}: {source}", path.display())]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for plugin operations
pub type Result<T> = std::result::Result<T, PluginError>;
