//! Structured diagnostics collected during a regeneration run.
//!
//! Components never write warnings to a global sink. They receive a
//! `&mut Diagnostics` and push records; the caller decides how to render
//! them (the CLI prints a table and mirrors each record to `tracing`).

use serde::Serialize;

/// Machine-readable diagnostic kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticCode {
    /// Several nodes resolved to the same route name.
    NameConflict,
    /// An exclusion-list entry is not a valid glob and only matches literally.
    InvalidExclusion,
    /// A renamed route had no descriptor under its old name.
    MissingRenameTarget,
}

/// One row of a name-conflict batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictRow {
    pub name: String,
    pub path: String,
    /// Page-dir relative file, empty for nodes without a backing file.
    pub file: String,
}

/// A warning raised during a run. Nothing a run reports is fatal; fatal
/// conditions are `RouterError`s instead.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rows: Vec<ConflictRow>,
}

/// Accumulates diagnostics for one run.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    pub fn warn(&mut self, code: DiagnosticCode, message: impl Into<String>) {
        self.push(Diagnostic {
            code,
            message: message.into(),
            rows: Vec::new(),
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn with_code(&self, code: DiagnosticCode) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(move |d| d.code == code)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Mirror every record to `tracing` as a warning.
    pub fn emit_to_tracing(&self) {
        for diagnostic in &self.items {
            tracing::warn!("{}", diagnostic.message);
            for row in &diagnostic.rows {
                tracing::warn!("  {} -> {} ({})", row.name, row.path, row.file);
            }
        }
    }
}
