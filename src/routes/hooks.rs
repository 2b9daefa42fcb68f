//! Per-route overrides of derived values.
//!
//! The assembler asks a [`RouteHooks`] implementation for every value it
//! does not compute from the path grammar alone. [`ConfiguredHooks`] reads
//! the overrides from [`Settings`]; library callers can supply their own.

use serde_json::{Map, Value};

use super::grammar::route_name_from_path;
use super::node::{NodeKind, ROOT_ROUTE_NAME, ResolvedFile};
use crate::config::Settings;

/// A route before its name is fixed.
#[derive(Debug, Clone, Copy)]
pub struct RouteDraft<'a> {
    pub kind: NodeKind,
    pub file: Option<&'a ResolvedFile>,
    /// Canonical path produced by the grammar
    pub path: &'a str,
    pub origin_path: &'a str,
    pub group: Option<&'a str>,
}

pub trait RouteHooks: Send + Sync {
    fn route_name(&self, draft: &RouteDraft<'_>) -> String {
        route_name_from_path(draft.path)
    }

    fn route_path(&self, draft: &RouteDraft<'_>, _name: &str) -> String {
        draft.path.to_string()
    }

    fn route_layout(&self, draft: &RouteDraft<'_>, name: &str) -> String;

    fn route_lazy(&self, _name: &str) -> bool {
        true
    }

    /// Metadata merged into the route's `handle` without overwriting.
    fn route_handle(&self, _name: &str) -> Option<Map<String, Value>> {
        None
    }
}

/// Hooks driven by the `[routes]` and `[[layouts]]` settings.
#[derive(Debug, Clone)]
pub struct ConfiguredHooks {
    settings: Settings,
}

impl ConfiguredHooks {
    pub fn new(settings: &Settings) -> Self {
        Self {
            settings: settings.clone(),
        }
    }

    fn has_layout(&self, name: &str) -> bool {
        self.settings.layouts.iter().any(|l| l.name == name)
    }
}

impl RouteHooks for ConfiguredHooks {
    fn route_name(&self, draft: &RouteDraft<'_>) -> String {
        self.settings
            .routes
            .names
            .get(draft.origin_path)
            .cloned()
            .unwrap_or_else(|| route_name_from_path(draft.path))
    }

    fn route_path(&self, draft: &RouteDraft<'_>, name: &str) -> String {
        self.settings
            .routes
            .paths
            .get(name)
            .cloned()
            .unwrap_or_else(|| draft.path.to_string())
    }

    /// Explicit override, then a group naming a layout, then the first layout.
    fn route_layout(&self, draft: &RouteDraft<'_>, name: &str) -> String {
        if name == ROOT_ROUTE_NAME && draft.kind == NodeKind::Builtin {
            return String::new();
        }

        if let Some(layout) = self.settings.routes.layouts.get(name) {
            return layout.clone();
        }

        if let Some(group) = draft.group.filter(|g| self.has_layout(g)) {
            return group.to_string();
        }

        self.settings
            .layouts
            .first()
            .map(|l| l.name.clone())
            .unwrap_or_default()
    }

    fn route_lazy(&self, name: &str) -> bool {
        if self.settings.routes.eager.iter().any(|n| n == name) {
            return false;
        }
        self.settings.routes.lazy
    }

    fn route_handle(&self, name: &str) -> Option<Map<String, Value>> {
        self.settings
            .routes
            .handles
            .get(name)
            .filter(|handle| !handle.is_empty())
            .cloned()
    }
}
