//! The regeneration pipeline.
//!
//! One run: store init -> scan -> assemble -> identity diff -> manifest
//! sync -> emit artifacts -> persist snapshot. Stages run strictly in
//! sequence, and runs never overlap: a manual run and a watcher-triggered
//! run queue on the same lock.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::alias::load_aliases;
use crate::config::Settings;
use crate::diagnostics::Diagnostics;
use crate::emit::{EmitContext, emit_all};
use crate::error::RouterResult;
use crate::manifest::{RouteSynchronizer, SyncReport};
use crate::routes::{
    ChangeSet, ConfiguredHooks, NodeAssembler, RouteHooks, RouteNode, diff_snapshot, snapshot_of,
};
use crate::scan::PageScanner;
use crate::store::SupportStore;
use crate::watcher::{RegenerateHandler, WatchError};

/// Outcome of one regeneration run.
#[derive(Debug, Clone)]
pub struct GenerateReport {
    /// Final node graph, in route order
    pub nodes: Vec<RouteNode>,
    pub changes: ChangeSet,
    pub sync: SyncReport,
    /// Artifacts rewritten this run
    pub emitted: Vec<PathBuf>,
    pub diagnostics: Diagnostics,
}

pub struct RouterContext {
    settings: Settings,
    hooks: Arc<dyn RouteHooks>,
    scanner: PageScanner,
    emit_ctx: EmitContext,
    store: SupportStore,
    run_lock: Mutex<()>,
}

impl RouterContext {
    /// Context with hooks driven by settings.
    pub fn new(settings: Settings) -> RouterResult<Self> {
        let hooks = Arc::new(ConfiguredHooks::new(&settings));
        Self::with_hooks(settings, hooks)
    }

    /// Context with caller-supplied hooks.
    ///
    /// Fails on an empty layout table, an unreadable tsconfig, or an invalid
    /// page glob.
    pub fn with_hooks(settings: Settings, hooks: Arc<dyn RouteHooks>) -> RouterResult<Self> {
        settings.validate()?;

        let root = settings.root();
        let aliases = load_aliases(&root, &settings.alias)?;
        crate::debug_event!("context", "aliases", "{}", aliases.len());

        Ok(Self {
            emit_ctx: EmitContext::new(&settings, &aliases),
            scanner: PageScanner::new(&settings, aliases)?,
            store: SupportStore::new(root, &settings.output.support_dir),
            run_lock: Mutex::new(()),
            hooks,
            settings,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &SupportStore {
        &self.store
    }

    /// Run the full pipeline once.
    pub async fn generate(&self) -> RouterResult<GenerateReport> {
        let _guard = self.run_lock.lock().await;
        let mut diagnostics = Diagnostics::new();

        self.store.init().await?;

        let files = self.scanner.scan()?;
        crate::debug_event!("context", "scanned", "{} page files", files.len());

        let nodes =
            NodeAssembler::new(&self.settings, self.hooks.as_ref()).assemble(&files, &mut diagnostics);

        let prior = self.store.load_snapshot().await;
        let changes = diff_snapshot(&prior, &nodes);
        crate::debug_event!(
            "context",
            "identity diff",
            "{} added, {} renamed",
            changes.added.len(),
            changes.renamed.len()
        );

        let sync = RouteSynchronizer::new(&self.settings, self.hooks.as_ref())
            .sync(&nodes, &changes, &prior, &self.store, &mut diagnostics)
            .await?;

        let emitted = emit_all(&self.settings, &nodes, &self.emit_ctx).await?;

        self.store.save_snapshot(&snapshot_of(&nodes)).await?;

        crate::log_event!(
            "context",
            "generated",
            "{} routes, {} warning(s)",
            nodes.len(),
            diagnostics.len()
        );

        Ok(GenerateReport {
            nodes,
            changes,
            sync,
            emitted,
            diagnostics,
        })
    }
}

#[async_trait]
impl RegenerateHandler for RouterContext {
    async fn regenerate(&self, trigger: &str) -> Result<(), WatchError> {
        match self.generate().await {
            Ok(report) => {
                report.diagnostics.emit_to_tracing();
                Ok(())
            }
            Err(e) => Err(WatchError::HandlerFailed {
                handler: self.name().to_string(),
                path: trigger.to_string(),
                reason: e.to_string(),
            }),
        }
    }
}
