//! Crate-level error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the dashboard engine and its collaborators.
#[derive(Debug, Error)]
pub enum DashError {
    /// A vault node was expected at a path but is not there.
    #[error("node not found: {0}")]
    NodeNotFound(String),

    /// A path resolved to something other than a folder.
    #[error("not a folder: {0}")]
    NotAFolder(String),

    /// A document already exists where a new one would be created.
    #[error("document already exists: {0}")]
    AlreadyExists(String),

    /// Underlying host I/O failure.
    #[error("vault i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or persistence failure.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Filesystem watcher failure.
    #[error("watch error: {0}")]
    WatchError(String),

    /// A path outside the vault root was handed to the filesystem adapter.
    #[error("path escapes vault root: {0}")]
    OutsideVault(PathBuf),
}

impl From<config::ConfigError> for DashError {
    fn from(err: config::ConfigError) -> Self {
        DashError::ConfigError(err.to_string())
    }
}

impl From<toml::ser::Error> for DashError {
    fn from(err: toml::ser::Error) -> Self {
        DashError::ConfigError(err.to_string())
    }
}

impl From<notify::Error> for DashError {
    fn from(err: notify::Error) -> Self {
        DashError::WatchError(err.to_string())
    }
}
