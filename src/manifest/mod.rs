//! The generated, developer-editable route manifest.

pub mod sync;
pub mod syntax;

pub use sync::{RouteSynchronizer, SyncReport, descriptor_for, reconcile};
pub use syntax::{Manifest, Object, Property, Value, parse_manifest, print_manifest, print_record};

/// Module that declares the generated route types.
pub const TYPES_MODULE: &str = "@routegen/types";

/// First line of every generated file.
pub const GENERATED_NOTICE: &str = "// Generated by routegen. Route records in routes.ts may be edited;\n// name, path, layout and component are kept in sync with the page files.";

/// Source text of a manifest before the first run.
pub fn initial_manifest() -> String {
    format!(
        "{GENERATED_NOTICE}\n\nimport {{ redirect }} from 'react-router';\nimport type {{ GeneratedRoute }} from '{TYPES_MODULE}';\n\nexport const routes: GeneratedRoute[] = [];\n"
    )
}
