//! Route graph resolution: path grammar, node assembly and rename tracking.

pub mod assembler;
pub mod grammar;
pub mod hooks;
pub mod identity;
pub mod node;

pub use assembler::{NodeAssembler, compare_route_names};
pub use grammar::{ResolvedPath, import_name, params_from_path, resolve_path, route_name_from_path};
pub use hooks::{ConfiguredHooks, RouteDraft, RouteHooks};
pub use identity::{ChangeSet, IdentitySnapshot, RenamedNode, SnapshotEntry, diff_snapshot, snapshot_of};
pub use node::{
    NOT_FOUND_ROUTE_NAME, NodeKind, ParamKind, ROOT_ROUTE_NAME, ResolvedFile, RouteNode,
    RouteParams,
};
