//! Watch mode: page directory events collapsed into regeneration runs.
//!
//! # Architecture
//!
//! ```text
//! notify::RecommendedWatcher (page dirs, recursive)
//!   -> classify_event: add / remove per path
//!   -> page filter + exclusion list
//!   -> ChangeAggregator (trailing deadline)
//!   -> RegenerateHandler::regenerate(last path)
//! ```

mod debouncer;
mod error;
mod handler;
mod unified;

pub use debouncer::ChangeAggregator;
pub use error::WatchError;
pub use handler::{FsEvent, FsEventKind, RegenerateHandler};
pub use unified::{RouteWatcher, RouteWatcherBuilder, classify_event};
