//! Generate command - one pipeline run.

use anyhow::Result;
use std::sync::Arc;

use crate::cli::render::print_report;
use crate::config::Settings;
use crate::context::RouterContext;

pub async fn run_generate(settings: Settings) -> Result<Arc<RouterContext>> {
    let context = Arc::new(RouterContext::new(settings)?);
    let report = context.generate().await?;
    report.diagnostics.emit_to_tracing();
    print_report(&report, context.settings());
    Ok(context)
}
