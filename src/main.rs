//! Command-line entry point for routegen.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use routegen::Settings;
use routegen::cli::commands::{generate, init, watch};
use routegen::cli::{Cli, Commands};

/// Load layered settings, apply CLI overrides, and start logging.
fn load_settings(config: Option<PathBuf>, root: Option<PathBuf>) -> Result<Settings> {
    let mut settings = match config {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load()?,
    };
    if let Some(root) = root {
        settings.project_root = Some(root);
    }

    routegen::logging::init_with_config(&settings.logging);
    Ok(settings)
}

#[tokio::main]
async fn main() -> Result<()> {
    let Cli {
        config,
        root,
        command,
    } = Cli::parse();

    match command {
        Commands::Init { force } => {
            routegen::logging::init();
            let dir = match root {
                Some(root) => root,
                None => std::env::current_dir()?,
            };
            init::run_init(&dir, force).await
        }
        Commands::Generate => {
            let settings = load_settings(config, root)?;
            generate::run_generate(settings).await.map(|_| ())
        }
        Commands::Watch { debounce_ms } => {
            let settings = load_settings(config, root)?;
            watch::run_watch(settings, debounce_ms).await
        }
        Commands::Config => init::run_config(&load_settings(config, root)?),
    }
}
