//! Watch loop over the page directories.

use std::path::Path;
use std::sync::Arc;

use notify::event::ModifyKind;
use notify::{Event, EventKind, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};

use crate::alias::AliasTable;
use crate::config::Settings;
use crate::diagnostics::Diagnostics;
use crate::scan::PageScanner;
use crate::store::{ExclusionList, SupportStore};

use super::debouncer::ChangeAggregator;
use super::error::WatchError;
use super::handler::{FsEvent, FsEventKind, RegenerateHandler};

/// Translate a notify event into add/remove events.
///
/// Renames arrive as name changes; a path that still exists was added.
pub fn classify_event(event: &Event) -> Vec<FsEvent> {
    let kind = |path: &Path| match event.kind {
        EventKind::Create(_) => Some(FsEventKind::Add),
        EventKind::Remove(_) => Some(FsEventKind::Remove),
        EventKind::Modify(ModifyKind::Name(_)) if path.exists() => Some(FsEventKind::Add),
        EventKind::Modify(ModifyKind::Name(_)) => Some(FsEventKind::Remove),
        _ => None,
    };

    event
        .paths
        .iter()
        .filter_map(|path| {
            kind(path).map(|kind| FsEvent {
                kind,
                path: path.clone(),
            })
        })
        .collect()
}

/// Watches page directories and regenerates once per settled burst.
pub struct RouteWatcher {
    handler: Arc<dyn RegenerateHandler>,
    aggregator: ChangeAggregator,
    scanner: PageScanner,
    store: SupportStore,
    exclusions: ExclusionList,
    event_rx: mpsc::Receiver<FsEvent>,
    /// `None` when events come from an external source.
    _watcher: Option<notify::RecommendedWatcher>,
}

impl RouteWatcher {
    pub fn builder() -> RouteWatcherBuilder {
        RouteWatcherBuilder::new()
    }

    /// Run until the event source closes.
    ///
    /// Handler failures are logged and the loop keeps going.
    pub async fn watch(mut self) -> Result<(), WatchError> {
        self.reload_exclusions().await;
        crate::log_event!(
            "watcher",
            "started",
            "{} page dir(s)",
            self.scanner.page_roots().len()
        );

        loop {
            let deadline = self.aggregator.deadline();

            tokio::select! {
                event = self.event_rx.recv() => match event {
                    Some(event) => self.handle_event(event),
                    None => break,
                },

                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.fire().await;
                }
            }
        }

        // Source closed: let the last burst settle
        if let Some(deadline) = self.aggregator.deadline() {
            sleep_until(deadline).await;
            self.fire().await;
        }

        crate::log_event!("watcher", "stopped");
        Ok(())
    }

    fn handle_event(&mut self, event: FsEvent) {
        let Some(key) = self.qualifying_key(&event) else {
            crate::debug_event!("watcher", "ignored", "{:?} {}", event.kind, event.path.display());
            return;
        };

        if self
            .aggregator
            .record(key.clone(), Instant::now(), &self.exclusions)
        {
            crate::debug_event!("watcher", "pending", "{:?} {key}", event.kind);
        } else {
            crate::debug_event!("watcher", "excluded", "{key}");
        }
    }

    /// Project-relative key of a page event, or `None` if it is not one.
    ///
    /// Directory events below a page dir qualify too: moving a folder of
    /// pages produces a single event for the folder.
    fn qualifying_key(&self, event: &FsEvent) -> Option<String> {
        let path = &event.path;
        let is_page = self.scanner.page_relative(path).is_some();
        let is_dir_like = self.scanner.contains(path)
            && (path.is_dir() || (event.kind == FsEventKind::Remove && path.extension().is_none()));

        if !is_page && !is_dir_like {
            return None;
        }

        let relative = path.strip_prefix(self.scanner.root()).unwrap_or(path);
        Some(relative.to_string_lossy().replace('\\', "/"))
    }

    async fn fire(&mut self) {
        let Some(trigger) = self.aggregator.poll(Instant::now()) else {
            return;
        };

        crate::log_event!(self.handler.name(), "changed", "{trigger}");
        if let Err(e) = self.handler.regenerate(&trigger).await {
            tracing::error!("[{}] {e}", self.handler.name());
        }

        self.reload_exclusions().await;
    }

    async fn reload_exclusions(&mut self) {
        let mut diagnostics = Diagnostics::new();
        self.exclusions = self.store.load_exclusions(&mut diagnostics).await;
        diagnostics.emit_to_tracing();
    }
}

/// Builder for constructing a RouteWatcher.
pub struct RouteWatcherBuilder {
    settings: Option<Settings>,
    handler: Option<Arc<dyn RegenerateHandler>>,
    events: Option<mpsc::Receiver<FsEvent>>,
    debounce_ms: Option<u64>,
}

impl RouteWatcherBuilder {
    pub fn new() -> Self {
        Self {
            settings: None,
            handler: None,
            events: None,
            debounce_ms: None,
        }
    }

    pub fn settings(mut self, settings: &Settings) -> Self {
        self.settings = Some(settings.clone());
        self
    }

    pub fn handler(mut self, handler: Arc<dyn RegenerateHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Override `watch.debounce_ms`.
    pub fn debounce_ms(mut self, ms: u64) -> Self {
        self.debounce_ms = Some(ms);
        self
    }

    /// Feed events from a channel instead of the OS watcher.
    pub fn event_source(mut self, events: mpsc::Receiver<FsEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn build(self) -> Result<RouteWatcher, WatchError> {
        let settings = self.settings.ok_or_else(|| WatchError::InitFailed {
            reason: "Settings are required".to_string(),
        })?;

        let handler = self.handler.ok_or_else(|| WatchError::InitFailed {
            reason: "Handler is required".to_string(),
        })?;

        let scanner =
            PageScanner::new(&settings, AliasTable::new()).map_err(|e| WatchError::InitFailed {
                reason: e.to_string(),
            })?;

        let (event_rx, watcher) = match self.events {
            Some(events) => (events, None),
            None => {
                let (tx, rx) = mpsc::channel(100);
                let mut watcher =
                    notify::recommended_watcher(move |res: notify::Result<Event>| match res {
                        Ok(event) => {
                            for fs_event in classify_event(&event) {
                                let _ = tx.blocking_send(fs_event);
                            }
                        }
                        Err(e) => {
                            let error = WatchError::EventError {
                                details: e.to_string(),
                            };
                            tracing::error!("[watcher] {error}");
                        }
                    })?;

                for dir in scanner.page_roots() {
                    watch_directory(&mut watcher, &dir);
                }
                (rx, Some(watcher))
            }
        };

        Ok(RouteWatcher {
            handler,
            aggregator: ChangeAggregator::new(self.debounce_ms.unwrap_or(settings.watch.debounce_ms)),
            store: SupportStore::new(settings.root(), &settings.output.support_dir),
            exclusions: ExclusionList::default(),
            scanner,
            event_rx,
            _watcher: watcher,
        })
    }
}

impl Default for RouteWatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Watch a page dir recursively. A missing dir is skipped, not fatal.
fn watch_directory(watcher: &mut notify::RecommendedWatcher, dir: &Path) {
    match watcher.watch(dir, RecursiveMode::Recursive) {
        Ok(_) => crate::debug_event!("watcher", "watching", "{}", dir.display()),
        Err(e) => {
            let error = WatchError::PathWatchFailed {
                path: dir.to_path_buf(),
                reason: e.to_string(),
            };
            tracing::warn!("[watcher] {error}");
        }
    }
}
