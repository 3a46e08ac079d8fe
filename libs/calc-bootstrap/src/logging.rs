//! Logging initialization.
//!
//! The effective filter is resolved in this order: `RUST_LOG` if set, then the
//! `-v` count from the command line, then `LoggingConfig::level`.

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::UtcTime;

/// Output format for log lines.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging section of a service config.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default filter directive, e.g. `"info"` or `"calculator=debug,info"`.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: LogFormat::Text,
        }
    }
}

/// Filter directive implied by the `-v` count, if any.
#[must_use]
pub fn verbosity_directive(verbose: u8) -> Option<&'static str> {
    match verbose {
        0 => None,
        1 => Some("info"),
        2 => Some("debug"),
        _ => Some("trace"),
    }
}

fn build_filter(cfg: &LoggingConfig, verbose: u8) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    let directive = verbosity_directive(verbose).unwrap_or(cfg.level.as_str());
    EnvFilter::try_new(directive).unwrap_or_else(|e| {
        eprintln!("invalid log level '{directive}' ({e}), falling back to 'info'");
        EnvFilter::new("info")
    })
}

/// Install the global tracing subscriber.
///
/// `log` records from dependencies are bridged into tracing. Safe to call
/// more than once; later calls are ignored.
pub fn init_logging(cfg: &LoggingConfig, verbose: u8) {
    let filter = build_filter(cfg, verbose);
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(true);

    let result = match cfg.format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().with_current_span(true).try_init(),
    };

    if result.is_err() {
        tracing::debug!("global tracing subscriber already installed");
    }
}
