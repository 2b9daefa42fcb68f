//! Generator-managed state in the support directory.
//!
//! ```text
//! .routegen/
//!   node-backup.json    route name -> { filepath, identity }
//!   route-backup.json   deleted route name -> { filepath, routeCode }
//!   exclude-glob.json   paths and globs the watcher ignores
//! ```
//!
//! Every file is read whole and written whole. A missing or unparseable
//! file reads as its empty value; only write failures are errors.

use globset::{Glob, GlobMatcher};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::diagnostics::{DiagnosticCode, Diagnostics};
use crate::error::{RouterError, RouterResult};
use crate::routes::IdentitySnapshot;

const NODE_BACKUP_FILE: &str = "node-backup.json";
const ROUTE_BACKUP_FILE: &str = "route-backup.json";
const EXCLUDE_GLOB_FILE: &str = "exclude-glob.json";
const GITIGNORE_FILE: &str = ".gitignore";

/// A route descriptor removed from the manifest, kept for manual recovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteBackupEntry {
    pub filepath: String,
    pub route_code: String,
}

pub type RouteBackup = BTreeMap<String, RouteBackupEntry>;

/// Paths the watcher must ignore.
///
/// An entry matches a path equal to it, or any path it matches as a glob.
#[derive(Debug, Clone, Default)]
pub struct ExclusionList {
    entries: Vec<(String, Option<GlobMatcher>)>,
}

impl ExclusionList {
    /// Compile raw entries. Invalid globs keep literal matching and are reported.
    pub fn compile(entries: Vec<String>, diagnostics: &mut Diagnostics) -> Self {
        let entries = entries
            .into_iter()
            .map(|entry| match Glob::new(&entry) {
                Ok(glob) => {
                    let matcher = glob.compile_matcher();
                    (entry, Some(matcher))
                }
                Err(e) => {
                    diagnostics.warn(
                        DiagnosticCode::InvalidExclusion,
                        format!("exclusion '{entry}' is not a valid glob ({e}); matching it literally"),
                    );
                    (entry, None)
                }
            })
            .collect();

        Self { entries }
    }

    pub fn matches(&self, path: &str) -> bool {
        self.entries.iter().any(|(entry, matcher)| {
            entry == path || matcher.as_ref().is_some_and(|m| m.is_match(path))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Handle on the support directory of one project.
#[derive(Debug, Clone)]
pub struct SupportStore {
    project_root: PathBuf,
    dir: PathBuf,
    dir_name: String,
}

impl SupportStore {
    pub fn new(project_root: impl Into<PathBuf>, dir_name: impl Into<String>) -> Self {
        let project_root = project_root.into();
        let dir_name = dir_name.into();
        Self {
            dir: project_root.join(&dir_name),
            project_root,
            dir_name,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn node_backup_path(&self) -> PathBuf {
        self.dir.join(NODE_BACKUP_FILE)
    }

    fn route_backup_path(&self) -> PathBuf {
        self.dir.join(ROUTE_BACKUP_FILE)
    }

    fn exclude_glob_path(&self) -> PathBuf {
        self.dir.join(EXCLUDE_GLOB_FILE)
    }

    /// Create missing store files and make git ignore the directory.
    pub async fn init(&self) -> RouterResult<()> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| RouterError::io(&self.dir, e))?;

        write_if_missing(&self.node_backup_path(), "{}").await?;
        write_if_missing(&self.route_backup_path(), "{}").await?;
        write_if_missing(&self.exclude_glob_path(), "[]").await?;

        self.init_gitignore().await
    }

    async fn init_gitignore(&self) -> RouterResult<()> {
        let path = self.project_root.join(GITIGNORE_FILE);
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(RouterError::io(&path, e)),
        };

        let ignored = content.lines().any(|line| {
            let line = line.trim().trim_start_matches('/').trim_end_matches('/');
            line == self.dir_name
        });
        if ignored {
            return Ok(());
        }

        let mut updated = content;
        if !updated.is_empty() && !updated.ends_with('\n') {
            updated.push('\n');
        }
        updated.push_str(&self.dir_name);
        updated.push('\n');

        fs::write(&path, updated)
            .await
            .map_err(|e| RouterError::io(&path, e))?;
        crate::debug_event!("store", "added to .gitignore", "{}", self.dir_name);
        Ok(())
    }

    pub async fn load_snapshot(&self) -> IdentitySnapshot {
        read_json_or_default(&self.node_backup_path()).await
    }

    pub async fn save_snapshot(&self, snapshot: &IdentitySnapshot) -> RouterResult<()> {
        write_json(&self.node_backup_path(), snapshot).await
    }

    pub async fn load_route_backup(&self) -> RouteBackup {
        read_json_or_default(&self.route_backup_path()).await
    }

    /// Merge entries into the route backup. Existing entries are never pruned.
    pub async fn append_route_backup(&self, entries: RouteBackup) -> RouterResult<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let mut backup = self.load_route_backup().await;
        backup.extend(entries);
        write_json(&self.route_backup_path(), &backup).await
    }

    pub async fn load_exclusions(&self, diagnostics: &mut Diagnostics) -> ExclusionList {
        let entries: Vec<String> = read_json_or_default(&self.exclude_glob_path()).await;
        ExclusionList::compile(entries, diagnostics)
    }
}

async fn write_if_missing(path: &Path, content: &str) -> RouterResult<()> {
    if fs::try_exists(path).await.unwrap_or(false) {
        return Ok(());
    }
    fs::write(path, content)
        .await
        .map_err(|e| RouterError::io(path, e))
}

async fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) => {
            crate::debug_event!("store", "using empty state", "{}: {e}", path.display());
            return T::default();
        }
    };

    serde_json::from_str(&content).unwrap_or_else(|e| {
        crate::debug_event!("store", "unparseable, using empty state", "{}: {e}", path.display());
        T::default()
    })
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> RouterResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| RouterError::io(parent, e))?;
    }

    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');
    fs::write(path, json)
        .await
        .map_err(|e| RouterError::io(path, e))
}
