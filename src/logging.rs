//! Persistent logging.
//!
//! The terminal is owned by the UI, so records only go to a log file in the
//! platform data directory (`~/.local/share/datakit/logs/datakit.log` on
//! Linux). Every record carries a timestamp from the fmt layer. The default
//! level is `error`, so the file is effectively an error log unless debug
//! mode or `RUST_LOG` asks for more.

use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _, EnvFilter};

use crate::config::LoggingConfig;
use crate::APP_NAME;

pub const LOG_FILE_PREFIX: &str = "datakit";
pub const LOG_FILE_SUFFIX: &str = "log";

/// Default log directory: `<data_dir>/datakit/logs`.
pub fn default_log_dir() -> Result<PathBuf> {
    let base_dir = dirs::data_dir().ok_or_else(|| eyre!("Could not determine data directory"))?;
    Ok(base_dir.join(APP_NAME).join("logs"))
}

/// Resolve the log directory from (in order) an explicit override, the config, or the default.
pub fn resolve_log_dir(override_dir: Option<&Path>, config: &LoggingConfig) -> Result<PathBuf> {
    if let Some(dir) = override_dir {
        return Ok(dir.to_path_buf());
    }
    match config.directory.as_deref() {
        Some(dir) if !dir.trim().is_empty() => Ok(PathBuf::from(dir)),
        _ => default_log_dir(),
    }
}

/// Build the env filter: `RUST_LOG` wins, then debug mode, then the configured level.
fn env_filter(config: &LoggingConfig, debug: bool) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    let level = if debug { "debug" } else { config.level.as_str() };
    EnvFilter::try_new(format!("{}={}", env!("CARGO_CRATE_NAME"), level))
        .wrap_err_with(|| format!("Invalid log level: {}", level))
}

/// Install the global subscriber writing to `<log_dir>/datakit.log`.
///
/// Returns the path of the log directory. Calling this twice is an error.
pub fn init(log_dir: &Path, config: &LoggingConfig, debug: bool) -> Result<PathBuf> {
    std::fs::create_dir_all(log_dir)
        .wrap_err_with(|| format!("Failed to create log directory: {}", log_dir.display()))?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix(LOG_FILE_SUFFIX)
        .build(log_dir)
        .wrap_err("Failed to create log file appender")?;

    let file_layer = fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .with_writer(appender);

    tracing_subscriber::registry()
        .with(env_filter(config, debug)?)
        .with(file_layer)
        .try_init()
        .wrap_err("Failed to initialize logging")?;

    Ok(log_dir.to_path_buf())
}
