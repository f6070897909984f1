//! Process-wide `tracing` subscriber setup.

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{EnvConfig, DEFAULT_LOG_FILTER};

/// Installs the global subscriber: human-readable lines by default, JSON
/// lines when `log_json` is set. Output goes to stderr.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init(config: &EnvConfig) -> bool {
    let filter = build_filter(&config.log_filter);
    let installed = if config.log_json {
        fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
    } else {
        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
    };
    installed.is_ok()
}

/// Parses filter directives, falling back to the default level on bad input.
pub fn build_filter(directives: &str) -> EnvFilter {
    EnvFilter::try_new(directives).unwrap_or_else(|error| {
        eprintln!("ignoring invalid log filter {directives:?}: {error}");
        EnvFilter::new(DEFAULT_LOG_FILTER)
    })
}
