//! Builds the route node graph for one run.
//!
//! The graph always holds the Root and NotFound builtins, one node per
//! scanned page file, and one node per configured reuse pattern. Nodes that
//! resolve to an already taken name are dropped (first in scan order wins)
//! and reported as a single diagnostic batch.

use std::cmp::Ordering;
use std::collections::HashSet;

use super::grammar::{ResolvedPath, extract_group, params_from_path, resolve_path, rewrite_params};
use super::hooks::{RouteDraft, RouteHooks};
use super::node::{
    NOT_FOUND_ROUTE_NAME, NOT_FOUND_ROUTE_PATH, NodeKind, ROOT_ROUTE_NAME, ROOT_ROUTE_PATH,
    ResolvedFile, RouteNode,
};
use crate::config::Settings;
use crate::diagnostics::{ConflictRow, Diagnostic, DiagnosticCode, Diagnostics};

/// Total order on route names: Root, then NotFound, then lexical.
pub fn compare_route_names(a: &str, b: &str) -> Ordering {
    let rank = |name: &str| match name {
        ROOT_ROUTE_NAME => 0,
        NOT_FOUND_ROUTE_NAME => 1,
        _ => 2,
    };

    rank(a).cmp(&rank(b)).then_with(|| a.cmp(b))
}

pub struct NodeAssembler<'a> {
    settings: &'a Settings,
    hooks: &'a dyn RouteHooks,
    extensions: Vec<String>,
}

impl<'a> NodeAssembler<'a> {
    pub fn new(settings: &'a Settings, hooks: &'a dyn RouteHooks) -> Self {
        Self {
            settings,
            hooks,
            extensions: settings.page_extensions(),
        }
    }

    /// Build, de-duplicate and order the full node list.
    pub fn assemble(&self, files: &[ResolvedFile], diagnostics: &mut Diagnostics) -> Vec<RouteNode> {
        let mut candidates = self.builtin_nodes();
        candidates.extend(files.iter().map(|file| self.page_node(file)));
        candidates.extend(
            self.settings
                .routes
                .reuse
                .iter()
                .map(|pattern| self.reuse_node(pattern)),
        );

        let mut nodes = filter_conflicts(candidates, diagnostics);
        nodes.sort_by(|a, b| compare_route_names(&a.name, &b.name));

        crate::debug_event!("assemble", "nodes", "{}", nodes.len());
        nodes
    }

    fn builtin_nodes(&self) -> Vec<RouteNode> {
        let root = self.build(
            NodeKind::Builtin,
            None,
            ResolvedPath {
                path: ROOT_ROUTE_PATH.to_string(),
                origin_path: ROOT_ROUTE_PATH.to_string(),
                group: None,
            },
            Some(ROOT_ROUTE_NAME),
        );

        let not_found = self.build(
            NodeKind::Builtin,
            None,
            ResolvedPath {
                path: NOT_FOUND_ROUTE_PATH.to_string(),
                origin_path: NOT_FOUND_ROUTE_PATH.to_string(),
                group: None,
            },
            Some(NOT_FOUND_ROUTE_NAME),
        );

        vec![root, not_found]
    }

    fn page_node(&self, file: &ResolvedFile) -> RouteNode {
        let resolved = resolve_path(&file.relative_glob, &self.extensions);
        self.build(NodeKind::Page, Some(file), resolved, None)
    }

    /// Reuse patterns go through the same group and parameter rewriting.
    fn reuse_node(&self, pattern: &str) -> RouteNode {
        let origin_path = if pattern.starts_with('/') {
            pattern.to_string()
        } else {
            format!("/{pattern}")
        };
        let (grouped, group) = extract_group(&origin_path);

        let resolved = ResolvedPath {
            path: rewrite_params(&grouped),
            origin_path,
            group,
        };
        self.build(NodeKind::Reuse, None, resolved, None)
    }

    fn build(
        &self,
        kind: NodeKind,
        file: Option<&ResolvedFile>,
        resolved: ResolvedPath,
        fixed_name: Option<&str>,
    ) -> RouteNode {
        let draft = RouteDraft {
            kind,
            file,
            path: &resolved.path,
            origin_path: &resolved.origin_path,
            group: resolved.group.as_deref(),
        };

        let (name, path) = match fixed_name {
            Some(name) => (name.to_string(), resolved.path.clone()),
            None => {
                let name = self.hooks.route_name(&draft);
                let path = self.hooks.route_path(&draft, &name);
                (name, path)
            }
        };

        let component = match kind {
            NodeKind::Page => name.clone(),
            NodeKind::Reuse => self.settings.routes.reuse_component.clone(),
            NodeKind::Builtin if name == NOT_FOUND_ROUTE_NAME => {
                self.settings.routes.not_found_component.clone()
            }
            NodeKind::Builtin => String::new(),
        };

        RouteNode {
            kind,
            file: file.cloned(),
            params: params_from_path(&path),
            layout: self.hooks.route_layout(&draft, &name),
            lazy: self.hooks.route_lazy(&name),
            component,
            group: resolved.group.clone(),
            origin_path: resolved.origin_path.clone(),
            path,
            name,
        }
    }
}

/// Keep the first node per name; report every dropped node in one batch.
fn filter_conflicts(nodes: Vec<RouteNode>, diagnostics: &mut Diagnostics) -> Vec<RouteNode> {
    let mut seen = HashSet::new();
    let mut kept = Vec::with_capacity(nodes.len());
    let mut rows = Vec::new();

    for node in nodes {
        if seen.insert(node.name.clone()) {
            kept.push(node);
        } else {
            rows.push(ConflictRow {
                name: node.name.clone(),
                path: node.path.clone(),
                file: node.relative_glob().to_string(),
            });
        }
    }

    if !rows.is_empty() {
        diagnostics.push(Diagnostic {
            code: DiagnosticCode::NameConflict,
            message: format!(
                "{} route(s) share a name with an earlier route and were skipped; the first one is kept",
                rows.len()
            ),
            rows,
        });
    }

    kept
}
