//! Logging setup for the CLI and the watch loop.
//!
//! Provides compact timestamped logging with per-module level configuration.
//! Supports `RUST_LOG` environment variable for runtime overrides.
//!
//! # Configuration
//!
//! ```toml
//! [logging]
//! default = "warn"  # quiet by default
//!
//! [logging.modules]
//! routegen = "debug"
//! ```
//!
//! # Environment Variable
//!
//! `RUST_LOG` takes precedence over config:
//! ```bash
//! RUST_LOG=debug routegen watch
//! ```

use std::sync::Once;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::LoggingConfig;

static INIT: Once = Once::new();

/// Compact time format: HH:MM:SS.mmm
struct CompactTime;

impl FormatTime for CompactTime {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%H:%M:%S%.3f"))
    }
}

/// Build the filter directive string from config (`warn,watcher=debug`).
fn filter_directives(config: &LoggingConfig) -> String {
    let mut modules: Vec<_> = config.modules.iter().collect();
    modules.sort();

    let mut filter_str = config.default.clone();
    for (module, level) in modules {
        filter_str.push_str(&format!(",{module}={level}"));
    }
    filter_str
}

/// Initialize logging with configuration.
///
/// Call once at startup. Safe to call multiple times (only first call takes effect).
/// The `RUST_LOG` environment variable takes precedence over config settings.
pub fn init_with_config(config: &LoggingConfig) {
    INIT.call_once(|| {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            EnvFilter::new(filter_directives(config))
        };

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_timer(CompactTime)
            .with_level(true)
            .with_filter(filter);

        tracing_subscriber::registry().with(fmt_layer).init();
    });
}

/// Initialize logging with default configuration (`warn`).
pub fn init() {
    init_with_config(&LoggingConfig::default());
}

/// Log a pipeline event tagged with its stage.
///
/// # Examples
/// ```ignore
/// log_event!("sync", "created", "{}", name);
/// log_event!("watcher", "started");
/// ```
#[macro_export]
macro_rules! log_event {
    ($stage:expr, $event:expr) => {
        tracing::info!("[{}] {}", $stage, $event)
    };
    ($stage:expr, $event:expr, $($arg:tt)*) => {
        tracing::info!("[{}] {}: {}", $stage, $event, format!($($arg)*))
    };
}

/// Debug-only event logging.
///
/// # Examples
/// ```ignore
/// debug_event!("scan", "matched", "{}", path.display());
/// ```
#[macro_export]
macro_rules! debug_event {
    ($stage:expr, $event:expr) => {
        tracing::debug!("[{}] {}", $stage, $event)
    };
    ($stage:expr, $event:expr, $($arg:tt)*) => {
        tracing::debug!("[{}] {}: {}", $stage, $event, format!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directives_are_sorted() {
        let mut config = LoggingConfig::default();
        config.modules.insert("watcher".to_string(), "debug".to_string());
        config.modules.insert("sync".to_string(), "trace".to_string());

        assert_eq!(filter_directives(&config), "warn,sync=trace,watcher=debug");
    }
}
