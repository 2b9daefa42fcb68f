//! File-based route generation.
//!
//! Scans page directories, derives a route node per page, keeps an editable
//! route manifest in sync with the file tree (preserving hand-edited fields
//! across renames), and emits an import registry plus type declarations.

pub mod logging;

pub mod alias;
pub mod cli;
pub mod config;
pub mod context;
pub mod diagnostics;
pub mod emit;
pub mod error;
pub mod manifest;
pub mod routes;
pub mod scan;
pub mod store;
pub mod watcher;

pub use config::Settings;
pub use context::{GenerateReport, RouterContext};
pub use diagnostics::{Diagnostic, DiagnosticCode, Diagnostics};
pub use error::{RouterError, RouterResult};
pub use routes::{ConfiguredHooks, NodeKind, RouteHooks, RouteNode};
pub use watcher::{RouteWatcher, RouteWatcherBuilder};
