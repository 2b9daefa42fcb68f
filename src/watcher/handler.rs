//! Event and handler types for the watch loop.

use std::path::PathBuf;

use async_trait::async_trait;

use super::WatchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsEventKind {
    Add,
    Remove,
}

/// A raw add/remove event for one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsEvent {
    pub kind: FsEventKind,
    pub path: PathBuf,
}

impl FsEvent {
    pub fn add(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: FsEventKind::Add,
            path: path.into(),
        }
    }

    pub fn remove(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: FsEventKind::Remove,
            path: path.into(),
        }
    }
}

/// Called once per settled burst of page changes.
#[async_trait]
pub trait RegenerateHandler: Send + Sync {
    /// Handler name for logging.
    fn name(&self) -> &str {
        "regenerate"
    }

    /// Run a full regeneration. `trigger` is the project-relative path of
    /// the most recent change in the burst.
    async fn regenerate(&self, trigger: &str) -> Result<(), WatchError>;
}
