//! Error types for route generation.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that abort a regeneration run.
///
/// Recoverable conditions (missing snapshot, unreadable backup store,
/// malformed exclusion list) never surface here; they fall back to empty
/// state inside [`crate::store`].
#[derive(Error, Debug)]
pub enum RouterError {
    #[error("Manifest {path} has an unexpected shape: {reason}. Delete it to regenerate")]
    ManifestShape { path: PathBuf, reason: String },

    #[error("Manifest syntax error at {line}:{column}: {message}")]
    ManifestSyntax {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("At least one layout must be configured")]
    NoLayouts,

    #[error("Failed to load aliases from {path}: {reason}")]
    AliasSource { path: PathBuf, reason: String },

    #[error("Invalid glob pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} already exists. Use --force to overwrite")]
    AlreadyExists { path: PathBuf },

    #[error("Configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl RouterError {
    /// Wrap an IO error with the path it occurred on.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        RouterError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn shape(path: impl AsRef<Path>, reason: impl Into<String>) -> Self {
        RouterError::ManifestShape {
            path: path.as_ref().to_path_buf(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for RouterError {
    fn from(e: serde_json::Error) -> Self {
        RouterError::Serialization(e.to_string())
    }
}

pub type RouterResult<T> = Result<T, RouterError>;
