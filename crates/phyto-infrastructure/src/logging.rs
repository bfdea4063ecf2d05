//! Tracing subscriber setup shared by the binaries.

use phyto_core::config::LoggingConfig;
use phyto_core::{PhytoError, Result};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Where log lines go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    /// Stdout, plus a daily file when a log directory is configured.
    Console,
    /// Daily file only; for interactive programs that own the terminal.
    FileOnly,
}

/// Installs the global subscriber.
///
/// `RUST_LOG` wins over the configured filter. The returned guard must be
/// kept alive for the file writer to flush.
pub fn init_logging(
    config: &LoggingConfig,
    file_prefix: &str,
    output: LogOutput,
) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .map_err(|e| PhytoError::config(format!("invalid log filter: {e}")))?;

    let directory = match (output, &config.directory) {
        (_, Some(dir)) => Some(dir.clone()),
        (LogOutput::FileOnly, None) => Some(default_log_dir()?),
        (LogOutput::Console, None) => None,
    };

    let (file_layer, guard) = match directory {
        Some(dir) => {
            std::fs::create_dir_all(&dir)?;
            let appender = tracing_appender::rolling::daily(&dir, format!("{file_prefix}.log"));
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let console_layer = (output == LogOutput::Console).then(|| {
        fmt::layer()
            .with_target(false)
            .with_thread_ids(false)
            .compact()
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| PhytoError::internal(format!("failed to install subscriber: {e}")))?;

    Ok(guard)
}

fn default_log_dir() -> Result<PathBuf> {
    crate::paths::PhytoPaths::logs_dir().map_err(|e| PhytoError::config(e.to_string()))
}
