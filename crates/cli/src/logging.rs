//! Logging setup for CLI commands and watch mode

use std::path::{Path, PathBuf};

use taskdeck_core::LogConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Directory holding watch-mode log files for a vault
pub fn log_dir(vault: &Path) -> PathBuf {
  vault.join(".taskdeck").join("logs")
}

/// Parse log level from config string
fn parse_log_level(level: &str) -> tracing::Level {
  match level.to_lowercase().as_str() {
    "off" | "error" => tracing::Level::ERROR,
    "warn" => tracing::Level::WARN,
    "info" => tracing::Level::INFO,
    "debug" => tracing::Level::DEBUG,
    "trace" => tracing::Level::TRACE,
    _ => tracing::Level::INFO,
  }
}

fn env_filter(level: tracing::Level) -> EnvFilter {
  EnvFilter::builder()
    .with_default_directive(level.into())
    .from_env_lossy()
}

/// One-shot commands: warnings and above on stderr so stdout stays parseable
pub fn init_cli_logging() {
  tracing_subscriber::fmt()
    .with_env_filter(env_filter(tracing::Level::WARN))
    .with_writer(std::io::stderr)
    .init();
}

/// Watch mode: configured level, on stderr or in a rolling file under the vault.
///
/// Returns the guard that must be kept alive for file logging to flush.
pub fn init_watch_logging(vault: &Path, config: &LogConfig, to_file: bool) -> Option<WorkerGuard> {
  let filter = env_filter(parse_log_level(&config.level));

  if !to_file {
    tracing_subscriber::fmt()
      .with_env_filter(filter)
      .with_target(true)
      .with_writer(std::io::stderr)
      .init();
    return None;
  }

  let dir = log_dir(vault);
  if std::fs::create_dir_all(&dir).is_err() {
    init_cli_logging();
    return None;
  }

  let appender = match config.rotation.as_str() {
    "hourly" => tracing_appender::rolling::hourly(&dir, "taskdeck.log"),
    "never" => tracing_appender::rolling::never(&dir, "taskdeck.log"),
    _ => tracing_appender::rolling::daily(&dir, "taskdeck.log"),
  };
  let (writer, guard) = tracing_appender::non_blocking(appender);

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_target(true)
    .with_ansi(false)
    .with_writer(writer)
    .init();

  Some(guard)
}
