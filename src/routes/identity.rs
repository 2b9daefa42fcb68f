//! Rename detection from file identity.
//!
//! A route name is a function of its file path, so moving a page changes its
//! name. The file's OS identity survives the move; comparing identities
//! against the previous run's snapshot tells a moved page from a new one.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use super::node::RouteNode;

/// Snapshot entry for one page route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub filepath: String,
    pub identity: u64,
}

/// Route name -> file identity, as of the previous run.
pub type IdentitySnapshot = BTreeMap<String, SnapshotEntry>;

#[derive(Debug, Clone, PartialEq)]
pub struct RenamedNode {
    pub node: RouteNode,
    pub old_name: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    pub added: Vec<RouteNode>,
    pub renamed: Vec<RenamedNode>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.renamed.is_empty()
    }

    pub fn is_rename_target(&self, name: &str) -> bool {
        self.renamed.iter().any(|r| r.node.name == name)
    }

    pub fn is_rename_source(&self, name: &str) -> bool {
        self.renamed.iter().any(|r| r.old_name == name)
    }
}

/// Classify page nodes against the previous snapshot.
///
/// Builtin and reuse nodes have no identity and are skipped.
pub fn diff_snapshot(prior: &IdentitySnapshot, nodes: &[RouteNode]) -> ChangeSet {
    let mut by_identity: HashMap<u64, &str> = HashMap::with_capacity(prior.len());
    for (name, entry) in prior {
        by_identity.entry(entry.identity).or_insert(name.as_str());
    }

    let mut changes = ChangeSet::default();

    for node in nodes {
        let Some(identity) = node.identity() else {
            continue;
        };

        match by_identity.get(&identity) {
            Some(old_name) if *old_name != node.name => {
                changes.renamed.push(RenamedNode {
                    node: node.clone(),
                    old_name: old_name.to_string(),
                });
            }
            Some(_) => {}
            None if !prior.contains_key(&node.name) => changes.added.push(node.clone()),
            None => {}
        }
    }

    changes
}

/// Snapshot of the current page nodes, persisted for the next run.
pub fn snapshot_of(nodes: &[RouteNode]) -> IdentitySnapshot {
    nodes
        .iter()
        .filter_map(|node| {
            let file = node.file.as_ref()?;
            Some((
                node.name.clone(),
                SnapshotEntry {
                    filepath: file.absolute_path.to_string_lossy().replace('\\', "/"),
                    identity: file.identity,
                },
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::node::{NodeKind, ResolvedFile, RouteParams};
    use std::path::PathBuf;

    fn page(name: &str, identity: u64) -> RouteNode {
        RouteNode {
            kind: NodeKind::Page,
            file: Some(ResolvedFile {
                page_dir: "src/pages".to_string(),
                relative_glob: format!("{}.tsx", name.to_lowercase()),
                absolute_path: PathBuf::from(format!("/p/{name}.tsx")),
                module_import_path: String::new(),
                identity,
            }),
            path: format!("/{}", name.to_lowercase()),
            name: name.to_string(),
            origin_path: String::new(),
            component: name.to_string(),
            layout: "base".to_string(),
            group: None,
            params: RouteParams::new(),
            lazy: true,
        }
    }

    fn snapshot(entries: &[(&str, u64)]) -> IdentitySnapshot {
        entries
            .iter()
            .map(|(name, identity)| {
                (
                    name.to_string(),
                    SnapshotEntry {
                        filepath: format!("/p/{name}.tsx"),
                        identity: *identity,
                    },
                )
            })
            .collect()
    }

    #[test]
    fn test_rename_detected_by_identity() {
        let prior = snapshot(&[("UserProfile", 5)]);
        let changes = diff_snapshot(&prior, &[page("UserProfileEdit", 5)]);

        assert!(changes.added.is_empty());
        assert_eq!(changes.renamed.len(), 1);
        assert_eq!(changes.renamed[0].node.name, "UserProfileEdit");
        assert_eq!(changes.renamed[0].old_name, "UserProfile");
    }

    #[test]
    fn test_new_file_is_added() {
        let prior = snapshot(&[("Home", 1)]);
        let changes = diff_snapshot(&prior, &[page("Home", 1), page("About", 2)]);

        assert_eq!(changes.added.len(), 1);
        assert_eq!(changes.added[0].name, "About");
        assert!(changes.renamed.is_empty());
    }

    #[test]
    fn test_unchanged_produces_no_event() {
        let prior = snapshot(&[("Home", 1), ("About", 2)]);
        let changes = diff_snapshot(&prior, &[page("Home", 1), page("About", 2)]);
        assert!(changes.is_empty());
    }

    #[test]
    fn test_same_name_new_identity_is_not_added() {
        // Deleted and recreated under the same name
        let prior = snapshot(&[("Home", 1)]);
        let changes = diff_snapshot(&prior, &[page("Home", 7)]);
        assert!(changes.is_empty());
    }

    #[test]
    fn test_snapshot_skips_nodes_without_files() {
        let mut builtin = page("Root", 0);
        builtin.kind = NodeKind::Builtin;
        builtin.file = None;

        let snapshot = snapshot_of(&[builtin, page("Home", 3)]);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot["Home"].identity, 3);
        assert_eq!(snapshot["Home"].filepath, "/p/Home.tsx");
    }
}
