//! Diagnostic logging to stderr with `tracing`.
//!
//! The level comes from `[logging] level` in the config, raised to `debug`
//! by `--debug`. A `RUST_LOG` environment variable replaces both.

use color_eyre::Result;
use tracing_subscriber::{fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _, EnvFilter};

pub const LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

/// Filter directive for our own events. Dependencies stay at `warn`.
pub fn filter_directive(level: &str, debug: bool) -> String {
    let level = if debug { "debug" } else { level };
    format!("warn,sheetlens={}", level)
}

/// Install the global subscriber. Call once, before loading anything.
pub fn init(level: &str, debug: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(level, debug)));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(filter)
        .try_init()?;
    Ok(())
}
