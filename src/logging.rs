//! Tracing setup for the daemon and the one-shot subcommands.
//!
//! `start` logs JSON to a daily-rotated file and compact text to stderr.
//! `check` and `validate` only log to stderr.

use std::path::Path;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// File name prefix for rotated JSON logs.
pub const LOG_FILE_PREFIX: &str = "telemon.log";

/// Filter used when `RUST_LOG` is unset. HTTP and bot plumbing is kept at
/// `warn` so poll cycles stay readable.
pub const DEFAULT_FILTER: &str = "info,hyper=warn,hyper_util=warn,reqwest=warn,teloxide=warn";

/// Keeps the non-blocking file writer alive. Dropping it flushes pending
/// entries.
pub struct LoggingGuard {
    _guard: WorkerGuard,
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the daemon subscriber, writing to
/// `{logs_dir}/telemon.log.YYYY-MM-DD` and stderr.
///
/// # Errors
///
/// Returns an error if the logs directory cannot be created or a global
/// subscriber is already installed.
pub fn init_production(logs_dir: &Path) -> anyhow::Result<LoggingGuard> {
    std::fs::create_dir_all(logs_dir)
        .with_context(|| format!("failed to create logs directory {}", logs_dir.display()))?;

    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(logs_dir, LOG_FILE_PREFIX));

    tracing_subscriber::registry()
        .with(env_filter())
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_writer(writer),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(std::io::stderr),
        )
        .try_init()
        .context("failed to install tracing subscriber")?;

    Ok(LoggingGuard { _guard: guard })
}

/// Install a stderr-only subscriber for one-shot subcommands. A subscriber
/// that is already installed is left in place.
pub fn init_cli() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
