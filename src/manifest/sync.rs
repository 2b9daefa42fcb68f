//! Keeps the route manifest in step with the node graph.
//!
//! The synchronizer owns the list structure (which records exist and their
//! order) and four fields per record: `name`, `path`, `layout` and
//! `component`. Everything else in a record belongs to the developer and is
//! only ever added to, never overwritten or dropped, except when the whole
//! record goes because its page was deleted. Deleted records are written to
//! the route backup first.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use tokio::fs;

use super::initial_manifest;
use super::syntax::{Manifest, Object, Value, parse_manifest, print_manifest, print_record};
use crate::config::Settings;
use crate::diagnostics::{DiagnosticCode, Diagnostics};
use crate::error::{RouterError, RouterResult};
use crate::routes::{
    ChangeSet, IdentitySnapshot, NodeKind, ROOT_ROUTE_NAME, RenamedNode, RouteHooks, RouteNode,
    compare_route_names,
};
use crate::store::{RouteBackup, RouteBackupEntry, SupportStore};

/// What one synchronization changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    /// The manifest had no records and was built from scratch
    pub first_run: bool,
    pub created: Vec<String>,
    pub deleted: Vec<String>,
    /// `(old name, new name)`
    pub renamed: Vec<(String, String)>,
    /// Deleted records, keyed by route name
    pub backed_up: RouteBackup,
    /// Whether the manifest file changed on disk
    pub written: bool,
}

impl SyncReport {
    pub fn is_unchanged(&self) -> bool {
        self.created.is_empty() && self.deleted.is_empty() && self.renamed.is_empty()
    }
}

/// A fresh record for `node` with only generator-owned fields.
pub fn descriptor_for(node: &RouteNode, root_redirect: Option<&str>) -> Object {
    let mut record = Object::default();
    record.push("name", Value::Str(node.name.clone()));
    record.push("path", Value::Str(node.path.clone()));

    if node.kind == NodeKind::Builtin && node.name == ROOT_ROUTE_NAME {
        if let Some(target) = root_redirect {
            record.push("index", Value::Bool(true));
            record.push(
                "loader",
                Value::Raw(format!("() => redirect('{}')", target.replace('\'', "\\'"))),
            );
        }
    }

    if !node.layout.is_empty() {
        record.push("layout", Value::Str(node.layout.clone()));
    }
    if !node.component.is_empty() {
        record.push("component", Value::Str(node.component.clone()));
    }

    record
}

/// Apply the node graph and change set to a parsed manifest.
///
/// Pure: the returned report carries the records that must be backed up.
pub fn reconcile(
    manifest: &mut Manifest,
    nodes: &[RouteNode],
    changes: &ChangeSet,
    prior: &IdentitySnapshot,
    hooks: &dyn RouteHooks,
    root_redirect: Option<&str>,
    diagnostics: &mut Diagnostics,
) -> SyncReport {
    let mut report = SyncReport::default();

    if manifest.records.is_empty() {
        report.first_run = true;
        manifest.records = nodes
            .iter()
            .map(|node| descriptor_for(node, root_redirect))
            .collect();
        report.created = nodes.iter().map(|node| node.name.clone()).collect();
    } else {
        apply_changes(manifest, nodes, changes, prior, root_redirect, &mut report, diagnostics);
    }

    for node in nodes {
        let Some(handle) = hooks.route_handle(&node.name) else {
            continue;
        };
        if let Some(record) = find_record_mut(&mut manifest.records, &node.name) {
            merge_handle(record, &handle);
        }
    }

    sort_records(&mut manifest.records);
    report
}

fn apply_changes(
    manifest: &mut Manifest,
    nodes: &[RouteNode],
    changes: &ChangeSet,
    prior: &IdentitySnapshot,
    root_redirect: Option<&str>,
    report: &mut SyncReport,
    diagnostics: &mut Diagnostics,
) {
    let records = &mut manifest.records;

    let prior_paths: HashMap<String, String> = records
        .iter()
        .filter_map(|record| {
            let name = record.get_str("name")?;
            let path = record.get_str("path")?;
            Some((name.to_string(), path.to_string()))
        })
        .collect();
    let current: HashSet<&str> = nodes.iter().map(|node| node.name.as_str()).collect();

    let created: Vec<&RouteNode> = nodes
        .iter()
        .filter(|node| {
            !prior_paths.contains_key(&node.name) && !changes.is_rename_target(&node.name)
        })
        .collect();

    let mut deleted: Vec<&String> = prior_paths
        .keys()
        .filter(|name| !current.contains(name.as_str()) && !changes.is_rename_source(name))
        .collect();
    deleted.sort();

    for node in created {
        crate::debug_event!("sync", "created", "{}", node.name);
        records.push(descriptor_for(node, root_redirect));
        report.created.push(node.name.clone());
    }

    for name in deleted {
        if let Some(index) = position(records, name) {
            take_with_backup(records, index, name, prior, report);
        }
    }

    let renames = live_renames(changes, &current);
    apply_renames(records, renames, prior, root_redirect, report, diagnostics);

    // A node can still lack a record when a new file reuses a renamed route's old name
    for node in nodes {
        if find_record(records, &node.name).is_none() {
            records.push(descriptor_for(node, root_redirect));
            report.created.push(node.name.clone());
        }
    }
}

/// Renames whose target node is still part of the graph.
fn live_renames<'a>(changes: &'a ChangeSet, current: &HashSet<&str>) -> Vec<&'a RenamedNode> {
    changes
        .renamed
        .iter()
        .filter(|rename| current.contains(rename.node.name.as_str()))
        .collect()
}

/// Apply every rename against the records as they were before any of them.
///
/// Sources are located up front, so chains (`A -> B`, `B -> C`) and swaps
/// move each record exactly once. A target name only collides when its
/// record is not itself being renamed away.
fn apply_renames(
    records: &mut Vec<Object>,
    renames: Vec<&RenamedNode>,
    prior: &IdentitySnapshot,
    root_redirect: Option<&str>,
    report: &mut SyncReport,
    diagnostics: &mut Diagnostics,
) {
    let located: Vec<(&RenamedNode, Option<usize>)> = renames
        .into_iter()
        .map(|rename| (rename, position(records, &rename.old_name)))
        .collect();

    let sources: HashSet<&str> = located
        .iter()
        .filter(|(_, index)| index.is_some())
        .map(|&(rename, _)| rename.old_name.as_str())
        .collect();
    let existing: HashSet<String> = records
        .iter()
        .filter_map(|record| record.get_str("name").map(str::to_string))
        .collect();

    let mut orphaned = Vec::new();
    let mut missing = Vec::new();

    for (rename, index) in located {
        let node = &rename.node;
        let Some(index) = index else {
            missing.push(rename);
            continue;
        };

        // The new name keeps its own record; the old one is now orphaned
        if existing.contains(&node.name) && !sources.contains(node.name.as_str()) {
            orphaned.push((index, rename.old_name.as_str()));
            continue;
        }

        crate::debug_event!("sync", "renamed", "{} -> {}", rename.old_name, node.name);
        update_generated_fields(&mut records[index], node);
        report
            .renamed
            .push((rename.old_name.clone(), node.name.clone()));
    }

    orphaned.sort_by(|a, b| b.0.cmp(&a.0));
    for (index, name) in orphaned {
        take_with_backup(records, index, name, prior, report);
    }

    for rename in missing {
        let node = &rename.node;
        diagnostics.warn(
            DiagnosticCode::MissingRenameTarget,
            format!(
                "route '{}' was renamed to '{}' but the manifest has no record named '{}'; a new record was added",
                rename.old_name, node.name, rename.old_name
            ),
        );
        if find_record(records, &node.name).is_none() {
            records.push(descriptor_for(node, root_redirect));
            report.created.push(node.name.clone());
        }
    }
}

fn position(records: &[Object], name: &str) -> Option<usize> {
    records
        .iter()
        .position(|record| record.get_str("name") == Some(name))
}

/// Remove the record at `index`, keeping its text in the route backup.
fn take_with_backup(
    records: &mut Vec<Object>,
    index: usize,
    name: &str,
    prior: &IdentitySnapshot,
    report: &mut SyncReport,
) {
    let record = records.remove(index);
    report.deleted.push(name.to_string());

    // Without a known source file there is nothing to restore the record against
    if let Some(entry) = prior.get(name) {
        report.backed_up.insert(
            name.to_string(),
            RouteBackupEntry {
                filepath: entry.filepath.clone(),
                route_code: print_record(&record),
            },
        );
    }
    crate::debug_event!("sync", "deleted", "{name}");
}

/// Overwrite generator-owned fields; leave everything else alone.
fn update_generated_fields(record: &mut Object, node: &RouteNode) {
    record.set("name", Value::Str(node.name.clone()));
    record.set("path", Value::Str(node.path.clone()));

    // Same field order as a fresh descriptor
    for (key, value) in [("layout", &node.layout), ("component", &node.component)] {
        if record.contains_key(key) || !value.is_empty() {
            record.set(key, Value::Str(value.clone()));
        }
    }
}

/// Add handle keys the record does not have yet. Existing keys win.
fn merge_handle(record: &mut Object, handle: &serde_json::Map<String, serde_json::Value>) {
    if handle.is_empty() {
        return;
    }

    match record.get_mut("handle") {
        None => record.push(
            "handle",
            Value::from_json(&serde_json::Value::Object(handle.clone())),
        ),
        Some(Value::Object(existing)) => {
            for (key, value) in handle {
                if !existing.contains_key(key) {
                    existing.push(key, Value::from_json(value));
                }
            }
        }
        // A computed handle is developer-owned as a whole
        Some(_) => {}
    }
}

fn find_record<'a>(records: &'a [Object], name: &str) -> Option<&'a Object> {
    records
        .iter()
        .find(|record| record.get_str("name") == Some(name))
}

fn find_record_mut<'a>(records: &'a mut [Object], name: &str) -> Option<&'a mut Object> {
    records
        .iter_mut()
        .find(|record| record.get_str("name") == Some(name))
}

/// Route order for named records; records without a name go last.
fn sort_records(records: &mut [Object]) {
    records.sort_by(|a, b| match (a.get_str("name"), b.get_str("name")) {
        (Some(a), Some(b)) => compare_route_names(a, b),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}

/// Reads, reconciles and rewrites the manifest file.
pub struct RouteSynchronizer<'a> {
    manifest_path: PathBuf,
    root_redirect: Option<String>,
    hooks: &'a dyn RouteHooks,
}

impl<'a> RouteSynchronizer<'a> {
    pub fn new(settings: &Settings, hooks: &'a dyn RouteHooks) -> Self {
        Self {
            manifest_path: settings.manifest_path(),
            root_redirect: settings.routes.root_redirect.clone(),
            hooks,
        }
    }

    pub async fn sync(
        &self,
        nodes: &[RouteNode],
        changes: &ChangeSet,
        prior: &IdentitySnapshot,
        store: &SupportStore,
        diagnostics: &mut Diagnostics,
    ) -> RouterResult<SyncReport> {
        let path = &self.manifest_path;
        let source = match fs::read_to_string(path).await {
            Ok(source) if !source.trim().is_empty() => source,
            Ok(_) => initial_manifest(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => initial_manifest(),
            Err(e) => return Err(RouterError::io(path, e)),
        };

        let mut manifest = parse_manifest(&source, path)?;
        let mut report = reconcile(
            &mut manifest,
            nodes,
            changes,
            prior,
            self.hooks,
            self.root_redirect.as_deref(),
            diagnostics,
        );

        store.append_route_backup(report.backed_up.clone()).await?;

        let text = print_manifest(&manifest);
        if text != source {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| RouterError::io(parent, e))?;
            }
            fs::write(path, &text)
                .await
                .map_err(|e| RouterError::io(path, e))?;
            report.written = true;
        }

        crate::log_event!(
            "sync",
            "manifest",
            "{} created, {} deleted, {} renamed",
            report.created.len(),
            report.deleted.len(),
            report.renamed.len()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::{ConfiguredHooks, NodeAssembler, RenamedNode, ResolvedFile, SnapshotEntry};
    use std::path::Path;
    use tempfile::TempDir;

    fn file(relative: &str, identity: u64) -> ResolvedFile {
        ResolvedFile {
            page_dir: "src/pages".to_string(),
            relative_glob: relative.to_string(),
            absolute_path: PathBuf::from("/p/src/pages").join(relative),
            module_import_path: format!("@/pages/{relative}"),
            identity,
        }
    }

    fn nodes(settings: &Settings, files: &[ResolvedFile]) -> Vec<RouteNode> {
        let hooks = ConfiguredHooks::new(settings);
        NodeAssembler::new(settings, &hooks).assemble(files, &mut Diagnostics::new())
    }

    fn parse(source: &str) -> Manifest {
        parse_manifest(source, Path::new("routes.ts")).unwrap()
    }

    fn names(manifest: &Manifest) -> Vec<&str> {
        manifest
            .records
            .iter()
            .filter_map(|r| r.get_str("name"))
            .collect()
    }

    fn run(
        manifest: &mut Manifest,
        settings: &Settings,
        nodes: &[RouteNode],
        changes: &ChangeSet,
        prior: &IdentitySnapshot,
    ) -> (SyncReport, Diagnostics) {
        let hooks = ConfiguredHooks::new(settings);
        let mut diagnostics = Diagnostics::new();
        let report = reconcile(
            manifest,
            nodes,
            changes,
            prior,
            &hooks,
            settings.routes.root_redirect.as_deref(),
            &mut diagnostics,
        );
        (report, diagnostics)
    }

    const EXISTING: &str = r#"export const routes = [
  {
    name: 'Root',
    path: '/',
    index: true,
    loader: () => redirect('/home')
  },
  {
    name: 'NotFound',
    path: '*',
    layout: 'base',
    component: '404'
  },
  {
    name: 'About',
    path: '/about',
    layout: 'base',
    component: 'About'
  },
  {
    name: 'Home',
    path: '/home',
    layout: 'base',
    component: 'Home',
    loader: homeLoader,
    handle: {
      title: 'X'
    }
  }
];
"#;

    #[test]
    fn test_first_run_builds_every_record() {
        let settings = Settings::default();
        let nodes = nodes(&settings, &[file("home/index.tsx", 1)]);
        let mut manifest = parse(&initial_manifest());

        let (report, _) = run(
            &mut manifest,
            &settings,
            &nodes,
            &ChangeSet::default(),
            &IdentitySnapshot::new(),
        );

        assert!(report.first_run);
        assert_eq!(names(&manifest), vec!["Root", "NotFound", "Home"]);

        let printed = print_manifest(&manifest);
        assert!(printed.contains(
            "  {\n    name: 'Root',\n    path: '/',\n    index: true,\n    loader: () => redirect('/home')\n  },\n"
        ));
        assert!(printed.contains(
            "    name: 'Home',\n    path: '/home',\n    layout: 'base',\n    component: 'Home'\n"
        ));
        assert!(printed.ends_with("];\n"));
    }

    #[test]
    fn test_rename_keeps_developer_fields() {
        let settings = Settings::default();
        let nodes = nodes(
            &settings,
            &[file("about.tsx", 2), file("home-page/index.tsx", 1)],
        );
        let home_page = nodes.iter().find(|n| n.name == "HomePage").unwrap();
        let changes = ChangeSet {
            added: vec![],
            renamed: vec![RenamedNode {
                node: home_page.clone(),
                old_name: "Home".to_string(),
            }],
        };

        let mut manifest = parse(EXISTING);
        let (report, diagnostics) = run(
            &mut manifest,
            &settings,
            &nodes,
            &changes,
            &IdentitySnapshot::new(),
        );

        assert!(diagnostics.is_empty());
        assert_eq!(report.renamed, vec![("Home".to_string(), "HomePage".to_string())]);
        assert!(report.created.is_empty());
        assert!(report.deleted.is_empty());

        let record = find_record(&manifest.records, "HomePage").unwrap();
        assert_eq!(record.get_str("path"), Some("/home-page"));
        assert_eq!(record.get_str("component"), Some("HomePage"));
        assert_eq!(record.get("loader"), Some(&Value::Raw("homeLoader".to_string())));
        assert!(find_record(&manifest.records, "Home").is_none());
    }

    #[test]
    fn test_delete_writes_backup_when_file_known() {
        let settings = Settings::default();
        let nodes = nodes(&settings, &[file("home/index.tsx", 1)]);

        let mut prior = IdentitySnapshot::new();
        prior.insert(
            "About".to_string(),
            SnapshotEntry {
                filepath: "/p/src/pages/about.tsx".to_string(),
                identity: 2,
            },
        );

        let mut manifest = parse(EXISTING);
        let (report, _) = run(&mut manifest, &settings, &nodes, &ChangeSet::default(), &prior);

        assert_eq!(report.deleted, vec!["About"]);
        assert_eq!(names(&manifest), vec!["Root", "NotFound", "Home"]);

        let entry = &report.backed_up["About"];
        assert_eq!(entry.filepath, "/p/src/pages/about.tsx");
        assert_eq!(
            entry.route_code,
            "{\n  name: 'About',\n  path: '/about',\n  layout: 'base',\n  component: 'About'\n}"
        );
    }

    #[test]
    fn test_delete_without_prior_file_skips_backup() {
        let settings = Settings::default();
        let nodes = nodes(&settings, &[file("home/index.tsx", 1)]);

        let mut manifest = parse(EXISTING);
        let (report, _) = run(
            &mut manifest,
            &settings,
            &nodes,
            &ChangeSet::default(),
            &IdentitySnapshot::new(),
        );

        assert_eq!(report.deleted, vec!["About"]);
        assert!(report.backed_up.is_empty());
    }

    #[test]
    fn test_handle_merge_is_additive() {
        let mut settings = Settings::default();
        let handle = serde_json::json!({ "title": "Y", "icon": "Z" });
        settings.routes.handles.insert(
            "Home".to_string(),
            handle.as_object().unwrap().clone(),
        );
        settings.routes.handles.insert(
            "About".to_string(),
            serde_json::json!({ "title": "About us" }).as_object().unwrap().clone(),
        );
        let nodes = nodes(&settings, &[file("about.tsx", 2), file("home/index.tsx", 1)]);

        let mut manifest = parse(EXISTING);
        run(&mut manifest, &settings, &nodes, &ChangeSet::default(), &IdentitySnapshot::new());

        let home = find_record(&manifest.records, "Home").unwrap();
        let Some(Value::Object(handle)) = home.get("handle") else {
            panic!("handle should stay an object");
        };
        assert_eq!(handle.get_str("title"), Some("X"));
        assert_eq!(handle.get_str("icon"), Some("Z"));

        let about = find_record(&manifest.records, "About").unwrap();
        assert!(print_record(about).contains("handle: {\n    title: 'About us'\n  }"));
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let settings = Settings::default();
        let nodes = nodes(
            &settings,
            &[file("about.tsx", 2), file("home/index.tsx", 1), file("list/[[id]].tsx", 3)],
        );

        let mut manifest = parse(EXISTING);
        run(&mut manifest, &settings, &nodes, &ChangeSet::default(), &IdentitySnapshot::new());
        let first = print_manifest(&manifest);

        let mut manifest = parse(&first);
        let (report, _) = run(&mut manifest, &settings, &nodes, &ChangeSet::default(), &IdentitySnapshot::new());
        assert!(report.is_unchanged());
        assert_eq!(print_manifest(&manifest), first);
    }

    #[test]
    fn test_missing_rename_target_adds_record() {
        let settings = Settings::default();
        let nodes = nodes(
            &settings,
            &[file("about.tsx", 2), file("home/index.tsx", 1), file("news.tsx", 4)],
        );
        let news = nodes.iter().find(|n| n.name == "News").unwrap();
        let changes = ChangeSet {
            added: vec![],
            renamed: vec![RenamedNode {
                node: news.clone(),
                old_name: "Blog".to_string(),
            }],
        };

        let mut manifest = parse(EXISTING);
        let (report, diagnostics) = run(
            &mut manifest,
            &settings,
            &nodes,
            &changes,
            &IdentitySnapshot::new(),
        );

        assert_eq!(report.created, vec!["News"]);
        assert_eq!(
            diagnostics.with_code(DiagnosticCode::MissingRenameTarget).count(),
            1
        );
        assert!(find_record(&manifest.records, "News").is_some());
    }

    #[test]
    fn test_unnamed_records_sort_last() {
        let settings = Settings::default();
        let nodes = nodes(&settings, &[]);
        let mut manifest = parse(
            "const routes = [\n  { path: '/legacy', element: legacy },\n  { name: 'Root', path: '/' },\n  { name: 'NotFound', path: '*' }\n];",
        );

        run(&mut manifest, &settings, &nodes, &ChangeSet::default(), &IdentitySnapshot::new());

        assert_eq!(manifest.records.len(), 3);
        assert_eq!(manifest.records[2].get_str("path"), Some("/legacy"));
    }

    #[tokio::test]
    async fn test_sync_writes_file_and_backup() {
        let temp_dir = TempDir::new().unwrap();
        let settings = Settings {
            project_root: Some(temp_dir.path().to_path_buf()),
            ..Settings::default()
        };
        let hooks = ConfiguredHooks::new(&settings);
        let store = SupportStore::new(temp_dir.path(), &settings.output.support_dir);
        store.init().await.unwrap();

        let synchronizer = RouteSynchronizer::new(&settings, &hooks);
        let all = nodes(&settings, &[file("about.tsx", 2)]);
        let report = synchronizer
            .sync(&all, &ChangeSet::default(), &IdentitySnapshot::new(), &store, &mut Diagnostics::new())
            .await
            .unwrap();
        assert!(report.first_run);
        assert!(report.written);

        let text = std::fs::read_to_string(settings.manifest_path()).unwrap();
        assert!(text.starts_with("// Generated by routegen."));
        assert!(text.contains("name: 'About'"));

        let mut prior = IdentitySnapshot::new();
        prior.insert(
            "About".to_string(),
            SnapshotEntry {
                filepath: "/p/src/pages/about.tsx".to_string(),
                identity: 2,
            },
        );
        let report = synchronizer
            .sync(&nodes(&settings, &[]), &ChangeSet::default(), &prior, &store, &mut Diagnostics::new())
            .await
            .unwrap();
        assert_eq!(report.deleted, vec!["About"]);
        assert!(store.load_route_backup().await.contains_key("About"));

        let report = synchronizer
            .sync(&nodes(&settings, &[]), &ChangeSet::default(), &prior, &store, &mut Diagnostics::new())
            .await
            .unwrap();
        assert!(!report.written);
    }

    #[tokio::test]
    async fn test_sync_rejects_foreign_manifest() {
        let temp_dir = TempDir::new().unwrap();
        let settings = Settings {
            project_root: Some(temp_dir.path().to_path_buf()),
            ..Settings::default()
        };
        let path = settings.manifest_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "export const routes = createRoutes();\n").unwrap();

        let hooks = ConfiguredHooks::new(&settings);
        let store = SupportStore::new(temp_dir.path(), &settings.output.support_dir);
        let result = RouteSynchronizer::new(&settings, &hooks)
            .sync(&nodes(&settings, &[]), &ChangeSet::default(), &IdentitySnapshot::new(), &store, &mut Diagnostics::new())
            .await;

        assert!(matches!(result, Err(RouterError::ManifestShape { .. })));
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "export const routes = createRoutes();\n"
        );
    }

    const PAIR: &str = r#"export const routes = [
  {
    name: 'Root',
    path: '/',
    index: true,
    loader: () => redirect('/home')
  },
  {
    name: 'NotFound',
    path: '*',
    layout: 'base',
    component: '404'
  },
  // keep: Alpha is hand-tuned
  {
    name: 'Alpha',
    path: '/alpha',
    layout: 'base',
    component: 'Alpha',
    loader: alphaLoader
  },
  {
    name: 'Beta',
    path: '/beta',
    layout: 'base',
    component: 'Beta',
    loader: betaLoader
  }
];
"#;

    fn renamed(nodes: &[RouteNode], old_name: &str, new_name: &str) -> RenamedNode {
        RenamedNode {
            node: nodes.iter().find(|n| n.name == new_name).unwrap().clone(),
            old_name: old_name.to_string(),
        }
    }

    fn prior_for(names: &[&str]) -> IdentitySnapshot {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                (
                    name.to_string(),
                    SnapshotEntry {
                        filepath: format!("/p/src/pages/{}.tsx", name.to_lowercase()),
                        identity: i as u64 + 1,
                    },
                )
            })
            .collect()
    }

    fn loader_of<'a>(manifest: &'a Manifest, name: &str) -> Option<&'a Value> {
        find_record(&manifest.records, name)?.get("loader")
    }

    #[test]
    fn test_chained_rename_moves_each_record_once() {
        // beta.tsx -> gamma.tsx, then alpha.tsx -> beta.tsx
        let settings = Settings::default();
        let nodes = nodes(&settings, &[file("beta.tsx", 1), file("gamma.tsx", 2)]);
        let changes = ChangeSet {
            added: vec![],
            renamed: vec![
                renamed(&nodes, "Alpha", "Beta"),
                renamed(&nodes, "Beta", "Gamma"),
            ],
        };

        let mut manifest = parse(PAIR);
        let (report, diagnostics) = run(
            &mut manifest,
            &settings,
            &nodes,
            &changes,
            &prior_for(&["Alpha", "Beta"]),
        );

        assert!(diagnostics.is_empty());
        assert!(report.created.is_empty());
        assert!(report.deleted.is_empty());
        assert!(report.backed_up.is_empty());
        assert_eq!(report.renamed.len(), 2);
        assert_eq!(names(&manifest), vec!["Root", "NotFound", "Beta", "Gamma"]);
        assert_eq!(
            loader_of(&manifest, "Beta"),
            Some(&Value::Raw("alphaLoader".to_string()))
        );
        assert_eq!(
            loader_of(&manifest, "Gamma"),
            Some(&Value::Raw("betaLoader".to_string()))
        );

        let beta = find_record(&manifest.records, "Beta").unwrap();
        assert_eq!(beta.comments, vec!["// keep: Alpha is hand-tuned"]);
        assert_eq!(beta.get_str("path"), Some("/beta"));
    }

    #[test]
    fn test_swapped_files_swap_records() {
        let settings = Settings::default();
        let nodes = nodes(&settings, &[file("alpha.tsx", 2), file("beta.tsx", 1)]);
        let changes = ChangeSet {
            added: vec![],
            renamed: vec![
                renamed(&nodes, "Alpha", "Beta"),
                renamed(&nodes, "Beta", "Alpha"),
            ],
        };

        let mut manifest = parse(PAIR);
        let (report, _) = run(
            &mut manifest,
            &settings,
            &nodes,
            &changes,
            &prior_for(&["Alpha", "Beta"]),
        );

        assert!(report.created.is_empty());
        assert!(report.deleted.is_empty());
        assert_eq!(names(&manifest), vec!["Root", "NotFound", "Alpha", "Beta"]);
        assert_eq!(
            loader_of(&manifest, "Beta"),
            Some(&Value::Raw("alphaLoader".to_string()))
        );
        assert_eq!(
            loader_of(&manifest, "Alpha"),
            Some(&Value::Raw("betaLoader".to_string()))
        );
    }

    #[test]
    fn test_rename_onto_kept_record_backs_up_source() {
        // alpha.tsx replaced beta.tsx; the Beta record stays as written
        let settings = Settings::default();
        let nodes = nodes(&settings, &[file("beta.tsx", 1)]);
        let changes = ChangeSet {
            added: vec![],
            renamed: vec![renamed(&nodes, "Alpha", "Beta")],
        };

        let mut manifest = parse(PAIR);
        let (report, _) = run(
            &mut manifest,
            &settings,
            &nodes,
            &changes,
            &prior_for(&["Alpha", "Beta"]),
        );

        assert!(report.renamed.is_empty());
        assert_eq!(report.deleted, vec!["Alpha"]);
        assert_eq!(names(&manifest), vec!["Root", "NotFound", "Beta"]);
        assert_eq!(
            loader_of(&manifest, "Beta"),
            Some(&Value::Raw("betaLoader".to_string()))
        );
        assert!(report.backed_up["Alpha"].route_code.contains("loader: alphaLoader"));
    }

    #[test]
    fn test_backup_keeps_comments_above_record() {
        let settings = Settings::default();
        let nodes = nodes(&settings, &[file("beta.tsx", 2)]);

        let mut manifest = parse(PAIR);
        let (report, _) = run(
            &mut manifest,
            &settings,
            &nodes,
            &ChangeSet::default(),
            &prior_for(&["Alpha", "Beta"]),
        );

        assert_eq!(report.deleted, vec!["Alpha"]);
        assert_eq!(
            report.backed_up["Alpha"].route_code,
            "// keep: Alpha is hand-tuned\n{\n  name: 'Alpha',\n  path: '/alpha',\n  layout: 'base',\n  component: 'Alpha',\n  loader: alphaLoader\n}"
        );
        assert!(!print_manifest(&manifest).contains("hand-tuned"));
    }

    #[test]
    fn test_renamed_record_without_layout_matches_fresh_order() {
        let settings = Settings::default();
        let nodes = nodes(&settings, &[file("gamma.tsx", 1)]);
        let changes = ChangeSet {
            added: vec![],
            renamed: vec![renamed(&nodes, "Bare", "Gamma")],
        };

        let mut manifest =
            parse("export const routes = [\n  {\n    name: 'Bare',\n    path: '/bare'\n  }\n];\n");
        run(&mut manifest, &settings, &nodes, &changes, &IdentitySnapshot::new());

        let gamma = find_record(&manifest.records, "Gamma").unwrap();
        assert_eq!(print_record(gamma), print_record(&descriptor_for(&nodes[2], None)));
    }
}
