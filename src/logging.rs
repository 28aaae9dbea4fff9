//! Log output.
//!
//! The terminal belongs to the UI, so events go to a daily rolling file under
//! `log_dir` instead of stderr.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

use crate::config::Settings;

/// File name prefix of the rolling log.
pub const LOG_FILE: &str = "roster.log";

/// Installs the global subscriber. Keep the returned guard alive until exit so
/// buffered lines are flushed.
pub fn init(settings: &Settings) -> color_eyre::Result<WorkerGuard> {
    std::fs::create_dir_all(&settings.log_dir)?;
    let appender = tracing_appender::rolling::daily(&settings.log_dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_filter))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .try_init()?;

    tracing::info!(log_dir = %settings.log_dir.display(), "logging initialized");
    Ok(guard)
}
