//! Logging for bizpulse
//!
//! Every command appends to a daily-rotated `bizpulse.log` in the XDG state
//! directory. Stdout stays reserved for command output, so nothing is logged
//! to the terminal.

use crate::config::{Config, LoggingConfig};
use crate::error::{Error, Result};
use std::ffi::OsString;
use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Install the file subscriber.
///
/// `RUST_LOG` overrides `config.level` when set. At most `config.max_files`
/// rotated files are kept.
pub fn init(config: &LoggingConfig) -> Result<LoggingGuard> {
    let (log_dir, prefix) = log_location();
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(prefix.to_string_lossy().into_owned())
        .max_log_files(config.max_files.max(1))
        .build(&log_dir)
        .map_err(|e| Error::Config(format!("failed to create log file: {}", e)))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true),
        )
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        database = %Config::database_path().display(),
        log_dir = %log_dir.display(),
        level = %config.level,
        "bizpulse logging started"
    );

    Ok(LoggingGuard { _guard: guard })
}

/// Route logs to the test harness's captured output.
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .with_span_events(FmtSpan::CLOSE)
        .try_init();
}

/// Flushes buffered log lines when dropped; hold it for the whole command.
pub struct LoggingGuard {
    _guard: tracing_appender::non_blocking::WorkerGuard,
}

/// Directory and file prefix for the rolling appender, split from
/// [`Config::log_path`].
fn log_location() -> (PathBuf, OsString) {
    let path = Config::log_path();
    let prefix = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_else(|| OsString::from("bizpulse.log"));
    let dir = path
        .parent()
        .map(|dir| dir.to_path_buf())
        .unwrap_or_else(Config::state_dir);
    (dir, prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_location_is_in_state_dir() {
        let (dir, prefix) = log_location();
        assert_eq!(prefix, OsString::from("bizpulse.log"));
        assert_eq!(dir, Config::state_dir());
    }
}
