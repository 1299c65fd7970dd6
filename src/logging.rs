// src/logging.rs

//! Log setup on `tracing-subscriber`.
//!
//! The filter comes from, in order:
//! 1. the `--logLevel` flag,
//! 2. `TSC_UTIL_LOG`, either a bare level (`debug`) or full filter directives
//!    (`tsc_util::watch=trace,info`),
//! 3. `info`.
//!
//! stdout carries compiler diagnostics only. Every log line goes to stderr
//! through the one subscriber installed here.

use anyhow::{Result, anyhow};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::LogLevel;

pub const LOG_ENV: &str = "TSC_UTIL_LOG";

/// Install the process-wide subscriber. Fails if one is already set.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env = std::env::var(LOG_ENV).ok();
    fmt()
        .with_env_filter(build_filter(cli_level, env.as_deref()))
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("failed to install log subscriber: {e}"))
}

/// Filter for the given flag and raw `TSC_UTIL_LOG` value.
///
/// Unparseable directives fall back to `info`.
pub fn build_filter(cli_level: Option<LogLevel>, env: Option<&str>) -> EnvFilter {
    let level = match (cli_level, env) {
        (Some(lvl), _) => level_from_log_level(lvl),
        (None, Some(raw)) => match parse_level_str(raw) {
            Some(level) => level,
            None => {
                return EnvFilter::try_new(raw.trim())
                    .unwrap_or_else(|_| EnvFilter::default().add_directive(LevelFilter::INFO.into()));
            }
        },
        (None, None) => tracing::Level::INFO,
    };
    EnvFilter::default().add_directive(LevelFilter::from_level(level).into())
}

pub fn level_from_log_level(lvl: LogLevel) -> tracing::Level {
    match lvl {
        LogLevel::Error => tracing::Level::ERROR,
        LogLevel::Warn => tracing::Level::WARN,
        LogLevel::Info => tracing::Level::INFO,
        LogLevel::Debug => tracing::Level::DEBUG,
        LogLevel::Trace => tracing::Level::TRACE,
    }
}

/// Bare level name, case-insensitive; `warning` is accepted for `warn`.
pub fn parse_level_str(s: &str) -> Option<tracing::Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(tracing::Level::ERROR),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "info" => Some(tracing::Level::INFO),
        "debug" => Some(tracing::Level::DEBUG),
        "trace" => Some(tracing::Level::TRACE),
        _ => None,
    }
}
