//! Init and Config commands.

use anyhow::Result;
use console::style;
use std::path::Path;

use crate::config::Settings;
use crate::store::SupportStore;

/// Run init command - create `routegen.toml` and the support directory in `dir`.
pub async fn run_init(dir: &Path, force: bool) -> Result<()> {
    let path = Settings::init_config_file(dir, force)?;
    println!(
        "{} {}",
        style("Created configuration file at:").green(),
        path.display()
    );

    let store = SupportStore::new(dir, &Settings::default().output.support_dir);
    store.init().await?;
    println!(
        "{} {}",
        style("Initialized support directory at:").green(),
        store.dir().display()
    );

    println!("Edit routegen.toml to customize your settings.");
    Ok(())
}

/// Run config command - display current configuration.
pub fn run_config(config: &Settings) -> Result<()> {
    println!("{}", style("Current Configuration:").cyan().bold());
    println!("{}", "=".repeat(50));
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}
