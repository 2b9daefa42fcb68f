//! Route node data model.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Name of the always-present root route.
pub const ROOT_ROUTE_NAME: &str = "Root";

/// Name of the always-present catch-all route.
pub const NOT_FOUND_ROUTE_NAME: &str = "NotFound";

pub const ROOT_ROUTE_PATH: &str = "/";

pub const NOT_FOUND_ROUTE_PATH: &str = "*";

/// A page file found during a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFile {
    /// Page directory the file was found under, as configured
    pub page_dir: String,
    /// Path relative to `page_dir`, `/`-separated (`user/[id].tsx`)
    pub relative_glob: String,
    pub absolute_path: PathBuf,
    /// Alias-rewritten, extension-stripped import specifier
    pub module_import_path: String,
    /// OS file identity, stable across renames
    pub identity: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    Required,
    Optional,
}

/// Ordered parameter map, derived from the canonical path.
pub type RouteParams = IndexMap<String, ParamKind>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Backed by a page file
    Page,
    /// Root or NotFound
    Builtin,
    /// Configured pattern without a backing file
    Reuse,
}

/// One route in the graph. Built fresh every run and never mutated after.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteNode {
    pub kind: NodeKind,
    /// Present only for `NodeKind::Page`
    pub file: Option<ResolvedFile>,
    /// URL pattern (`/list/:id?`)
    pub path: String,
    pub name: String,
    /// Path before group extraction and parameter rewriting
    pub origin_path: String,
    pub component: String,
    pub layout: String,
    pub group: Option<String>,
    pub params: RouteParams,
    pub lazy: bool,
}

impl RouteNode {
    pub fn is_builtin(&self) -> bool {
        self.kind == NodeKind::Builtin
    }

    pub fn is_reuse(&self) -> bool {
        self.kind == NodeKind::Reuse
    }

    /// File identity; `None` for builtin and reuse nodes.
    pub fn identity(&self) -> Option<u64> {
        self.file.as_ref().map(|f| f.identity)
    }

    /// Page-dir relative file, empty for nodes without a backing file.
    pub fn relative_glob(&self) -> &str {
        self.file
            .as_ref()
            .map(|f| f.relative_glob.as_str())
            .unwrap_or("")
    }
}
