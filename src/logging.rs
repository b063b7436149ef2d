//! Tracing subscriber setup.
//!
//! Logs go to stderr: stdout carries the MCP stdio protocol and the hook's
//! JSON notice. `RUST_LOG` takes precedence over the configured level.

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LogLevel;

/// Installs the global subscriber. Safe to call more than once; later calls
/// are ignored.
pub fn init_logging(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("fixhive={level},fixhive_core={level},warn")));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Truncates `text` to at most `max` characters for log fields.
pub fn preview(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
