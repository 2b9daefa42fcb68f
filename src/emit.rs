//! Derived artifacts written alongside the manifest.
//!
//! Both files are fully generated on every run; nothing in them is meant to
//! be edited. A file is only rewritten when its content changes, so the
//! watch loop is not re-triggered by identical output.

use std::path::{Path, PathBuf};
use tokio::fs;

use crate::alias::{AliasTable, normalize_path, resolve_import_path};
use crate::config::Settings;
use crate::error::{RouterError, RouterResult};
use crate::manifest::{GENERATED_NOTICE, TYPES_MODULE};
use crate::routes::grammar::{import_name, pascal_case};
use crate::routes::{NOT_FOUND_ROUTE_NAME, NodeKind, ROOT_ROUTE_NAME, RouteNode};

/// A configured layout with its import form resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLayout {
    pub name: String,
    /// `base` -> `BaseLayout`
    pub import_name: String,
    pub import_path: String,
    pub lazy: bool,
}

/// Inputs shared by every emitter.
#[derive(Debug, Clone)]
pub struct EmitContext {
    pub layouts: Vec<ResolvedLayout>,
}

impl EmitContext {
    pub fn new(settings: &Settings, aliases: &AliasTable) -> Self {
        let root = settings.root();
        let extensions = settings.page_extensions();

        let layouts = settings
            .layouts
            .iter()
            .map(|layout| ResolvedLayout {
                name: layout.name.clone(),
                import_name: format!("{}Layout", pascal_case(&layout.name)),
                import_path: resolve_import_path(
                    &normalize_path(&root.join(&layout.path)),
                    aliases,
                    &extensions,
                ),
                lazy: layout.lazy,
            })
            .collect();

        Self { layouts }
    }
}

/// Renders one generated file from the node graph.
pub trait Emitter: Send + Sync {
    /// Short label used in logs
    fn label(&self) -> &'static str;

    fn output_path(&self, settings: &Settings) -> PathBuf;

    fn render(&self, nodes: &[RouteNode], ctx: &EmitContext) -> String;
}

/// Route key / path type declarations.
pub struct DtsEmitter;

impl Emitter for DtsEmitter {
    fn label(&self) -> &'static str {
        "dts"
    }

    fn output_path(&self, settings: &Settings) -> PathBuf {
        settings.dts_path()
    }

    fn render(&self, nodes: &[RouteNode], ctx: &EmitContext) -> String {
        let layout_keys = if ctx.layouts.is_empty() {
            "never".to_string()
        } else {
            ctx.layouts
                .iter()
                .map(|l| format!("\"{}\"", l.name))
                .collect::<Vec<_>>()
                .join(" | ")
        };

        let mut code = format!(
            "{GENERATED_NOTICE}\n\ndeclare module \"{TYPES_MODULE}\" {{\n\n  /**\n   * route layout key\n   */\n  export type RouteLayoutKey = {layout_keys};\n\n  /**\n   * route path map\n   */\n  export type RoutePathMap = {{"
        );

        for node in nodes {
            code.push_str(&format!("\n    \"{}\": \"{}\";", node.name, node.path));
        }

        code.push_str(&format!(
            "\n  }};\n\n  /**\n   * route key\n   */\n  export type RouteKey = keyof RoutePathMap;\n\n  /**\n   * route path\n   */\n  export type RoutePath = RoutePathMap[RouteKey];\n\n  /**\n   * root route key\n   */\n  export type RootRouteKey = \"{ROOT_ROUTE_NAME}\";\n\n  /**\n   * not found route key\n   */\n  export type NotFoundRouteKey = \"{NOT_FOUND_ROUTE_NAME}\";\n\n  /**\n   * builtin route key\n   */\n  export type BuiltinRouteKey = RootRouteKey | NotFoundRouteKey;"
        ));

        let reuse: Vec<_> = nodes.iter().filter(|n| n.kind == NodeKind::Reuse).collect();
        code.push_str("\n\n  /**\n   * reuse route key\n   */\n  export type ReuseRouteKey = ");
        if reuse.is_empty() {
            code.push_str("never;");
        } else {
            code.push_str("Extract<\n    RouteKey,");
            for node in reuse {
                code.push_str(&format!("\n    | \"{}\"", node.name));
            }
            code.push_str("\n  >;");
        }

        code.push_str(
            "\n\n  /**\n   * route key with its own page file\n   */\n  export type RouteFileKey = Exclude<RouteKey, BuiltinRouteKey | ReuseRouteKey>;\n\n  /**\n   * record in the generated route manifest\n   */\n  export type GeneratedRoute = {\n    name: RouteKey;\n    path: RoutePath;\n    layout?: RouteLayoutKey;\n    component?: string;\n    index?: boolean;\n    handle?: Record<string, unknown>;\n    [key: string]: unknown;\n  };\n}\n",
        );

        code
    }
}

/// `layouts` and `pages` module registries.
pub struct ImportsEmitter;

impl Emitter for ImportsEmitter {
    fn label(&self) -> &'static str {
        "imports"
    }

    fn output_path(&self, settings: &Settings) -> PathBuf {
        settings.imports_path()
    }

    fn render(&self, nodes: &[RouteNode], ctx: &EmitContext) -> String {
        let mut imports =
            format!("import type {{ RouteFileKey, RouteLayoutKey }} from \"{TYPES_MODULE}\";\n");

        let mut layouts =
            String::from("\nexport const layouts: Record<RouteLayoutKey, () => Promise<any>> = {");
        for layout in &ctx.layouts {
            if layout.lazy {
                layouts.push_str(&format!(
                    "\n  {}: () => import(\"{}\"),",
                    layout.name, layout.import_path
                ));
            } else {
                imports.push_str(&format!(
                    "import {} from \"{}\";\n",
                    layout.import_name, layout.import_path
                ));
                layouts.push_str(&format!("\n  {}: {},", layout.name, layout.import_name));
            }
        }
        layouts.push_str("\n};\n");

        let mut pages =
            String::from("export const pages: Record<RouteFileKey, () => Promise<any>> = {");
        for node in nodes {
            let Some(file) = &node.file else {
                continue;
            };

            if node.lazy {
                pages.push_str(&format!(
                    "\n  {}: () => import(\"{}\"),",
                    node.name, file.module_import_path
                ));
            } else {
                let ident = import_name(&node.name);
                imports.push_str(&format!(
                    "import {ident} from \"{}\";\n",
                    file.module_import_path
                ));
                if ident == node.name {
                    pages.push_str(&format!("\n  {ident},"));
                } else {
                    pages.push_str(&format!("\n  {}: {ident},", node.name));
                }
            }
        }
        pages.push_str("\n};\n");

        format!("{GENERATED_NOTICE}\n\n{imports}{layouts}\n{pages}")
    }
}

/// Render every artifact and write the ones whose content changed.
///
/// Returns the paths that were written.
pub async fn emit_all(
    settings: &Settings,
    nodes: &[RouteNode],
    ctx: &EmitContext,
) -> RouterResult<Vec<PathBuf>> {
    let emitters: [&dyn Emitter; 2] = [&DtsEmitter, &ImportsEmitter];
    let mut written = Vec::new();

    for emitter in emitters {
        let path = emitter.output_path(settings);
        let text = emitter.render(nodes, ctx);

        if write_if_changed(&path, &text).await? {
            crate::debug_event!("emit", emitter.label(), "{}", path.display());
            written.push(path);
        }
    }

    Ok(written)
}

async fn write_if_changed(path: &Path, text: &str) -> RouterResult<bool> {
    if let Ok(existing) = fs::read_to_string(path).await {
        if existing == text {
            return Ok(false);
        }
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| RouterError::io(parent, e))?;
    }
    fs::write(path, text)
        .await
        .map_err(|e| RouterError::io(path, e))?;
    Ok(true)
}
