//! Diagnostic logging.
//!
//! Logs go to stderr with a compact `HH:MM:SS.mmm` timestamp so they stay
//! apart from the child's own output on stdout. Levels come from the
//! `[logging]` config section unless `RUST_LOG` is set. `-v` keeps the
//! coalescer's diagnostics on in both cases:
//!
//! ```bash
//! RUST_LOG=debug reloader main.go
//! RUST_LOG=reloader::watcher=trace reloader main.go
//! ```

use std::sync::Once;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::LoggingConfig;

static INIT: Once = Once::new();

/// Keeps the coalescer's stat diagnostics visible under `-v`, whatever the
/// other directives say.
const VERBOSE_DIRECTIVE: &str = "reloader::watcher::coalescer=debug";

/// Compact time format: HH:MM:SS.mmm
struct CompactTime;

impl FormatTime for CompactTime {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%H:%M:%S%.3f"))
    }
}

/// Build the filter directive string for a config.
///
/// `verbose` raises the default level to `debug`; per-module overrides
/// still apply on top, except that the coalescer stays at `debug`.
pub fn filter_directives(config: &LoggingConfig, verbose: bool) -> String {
    let mut directives = if verbose {
        "debug".to_string()
    } else {
        config.default.clone()
    };

    let mut modules: Vec<_> = config.modules.iter().collect();
    modules.sort();
    for (module, level) in modules {
        directives.push_str(&format!(",{module}={level}"));
    }
    if verbose {
        directives.push_str(&format!(",{VERBOSE_DIRECTIVE}"));
    }
    directives
}

/// Directives used when `RUST_LOG` is set. It replaces the config section
/// but not `-v`.
pub fn env_directives(rust_log: &str, verbose: bool) -> String {
    let rust_log = rust_log.trim();
    match (verbose, rust_log.is_empty()) {
        (true, true) => VERBOSE_DIRECTIVE.to_string(),
        (true, false) => format!("{rust_log},{VERBOSE_DIRECTIVE}"),
        (false, _) => rust_log.to_string(),
    }
}

/// Install the global subscriber. Only the first call has any effect.
pub fn init_with_config(config: &LoggingConfig, verbose: bool) {
    INIT.call_once(|| {
        let filter = match std::env::var("RUST_LOG") {
            Ok(rust_log) => EnvFilter::new(env_directives(&rust_log, verbose)),
            Err(_) => EnvFilter::new(filter_directives(config, verbose)),
        };

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_timer(CompactTime)
            .with_level(true)
            .with_filter(filter);

        tracing_subscriber::registry().with(fmt_layer).init();
    });
}

/// Log an event with component context at `info`.
///
/// # Examples
/// ```ignore
/// log_event!("reload", "restarting", "{} events", count);
/// log_event!("reload", "stopped");
/// ```
#[macro_export]
macro_rules! log_event {
    ($component:expr, $event:expr) => {
        tracing::info!("[{}] {}", $component, $event)
    };
    ($component:expr, $event:expr, $($arg:tt)*) => {
        tracing::info!("[{}] {}: {}", $component, $event, format!($($arg)*))
    };
}

/// Same as [`log_event!`] at `debug`.
#[macro_export]
macro_rules! debug_event {
    ($component:expr, $event:expr) => {
        tracing::debug!("[{}] {}", $component, $event)
    };
    ($component:expr, $event:expr, $($arg:tt)*) => {
        tracing::debug!("[{}] {}: {}", $component, $event, format!($($arg)*))
    };
}
