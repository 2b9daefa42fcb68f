//! Watch command - initial run, then regenerate on page changes.

use anyhow::Result;
use console::style;

use crate::cli::commands::generate::run_generate;
use crate::config::Settings;
use crate::watcher::RouteWatcher;

pub async fn run_watch(settings: Settings, debounce_ms: Option<u64>) -> Result<()> {
    let enabled = settings.watch.enabled;
    let context = run_generate(settings).await?;

    if !enabled {
        println!("{}", style("Watching is disabled (watch.enabled = false)").yellow());
        return Ok(());
    }

    let mut builder = RouteWatcher::builder()
        .settings(context.settings())
        .handler(context.clone());
    if let Some(ms) = debounce_ms {
        builder = builder.debounce_ms(ms);
    }
    let watcher = builder.build()?;

    println!(
        "{} {}",
        style("Watching").cyan().bold(),
        context
            .settings()
            .pages
            .dirs
            .join(", ")
    );

    tokio::select! {
        result = watcher.watch() => result?,
        _ = tokio::signal::ctrl_c() => {
            crate::log_event!("watcher", "stopped", "interrupt");
        }
    }

    Ok(())
}
