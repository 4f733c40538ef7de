//! Logging setup.

use anyhow::{Context, Result, anyhow};
use attrgate_config::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Installs a global `fmt` subscriber.
///
/// `RUST_LOG` wins when set; otherwise the configured filter is used.
///
/// # Errors
///
/// Fails if the filter cannot be parsed or a global subscriber is already
/// installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = env_filter(config, std::env::var("RUST_LOG").ok().as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(config.ansi)
        .with_target(config.with_target)
        .try_init()
        .map_err(|e| anyhow!("Failed to install tracing subscriber: {e}"))
}

fn env_filter(config: &LoggingConfig, rust_log: Option<&str>) -> Result<EnvFilter> {
    match rust_log.filter(|directives| !directives.trim().is_empty()) {
        Some(directives) => EnvFilter::try_new(directives)
            .with_context(|| format!("Invalid RUST_LOG directives '{directives}'")),
        None => EnvFilter::try_new(&config.filter)
            .with_context(|| format!("Invalid logging.filter '{}'", config.filter)),
    }
}
