//! CLI argument parsing using clap.

use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::PathBuf;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// File-based route generator
#[derive(Parser)]
#[command(
    name = "routegen",
    version = env!("CARGO_PKG_VERSION"),
    about = "Generate a typed route table from page files",
    long_about = "Scan page directories, keep the editable route manifest in sync, \
                  and emit the import registry and route type declarations.",
    next_line_help = true,
    styles = clap_cargo_style(),
    after_help = "Quick Start:\n  \
                  $ routegen init        # Write routegen.toml with defaults\n  \
                  $ routegen generate    # Regenerate once\n  \
                  $ routegen watch       # Regenerate on page changes"
)]
pub struct Cli {
    /// Path to custom routegen.toml file
    #[arg(short, long, global = true, env = "ROUTEGEN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Project root (overrides config)
    #[arg(short, long, global = true)]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Write a default routegen.toml
    #[command(about = "Create routegen.toml with default settings")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Run the pipeline once
    #[command(about = "Regenerate the manifest, import registry and type declarations")]
    Generate,

    /// Run once, then regenerate on page changes
    #[command(about = "Regenerate, then watch page directories")]
    Watch {
        /// Quiet period in milliseconds (overrides config)
        #[arg(long)]
        debounce_ms: Option<u64>,
    },

    /// Show current configuration
    #[command(about = "Display active settings")]
    Config,
}
