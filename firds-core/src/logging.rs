//! File logging for a pipeline run.
//!
//! Stages only use the `tracing` macros. The binary builds a subscriber here
//! and holds the returned guard for the length of the run; tests install
//! their own or none.

use crate::config::LogConfig;
use crate::error::{EtlError, Result};
use std::fs::OpenOptions;
use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;
use tracing::subscriber::DefaultGuard;
use tracing::{Level, Subscriber};
use tracing_subscriber::fmt::time::ChronoLocal;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

pub fn parse_level(level: &str) -> Result<Level> {
    Level::from_str(level).map_err(|_| EtlError::Config(format!("unknown log level '{level}'")))
}

/// Build a subscriber appending plain-text lines to `path`.
///
/// Each line carries timestamp, level, the enclosing operation (span) and the
/// message. Missing parent directories are created.
pub fn file_subscriber(path: &Path, level: Level) -> Result<impl Subscriber + Send + Sync> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    Ok(tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .with_max_level(level)
        .with_timer(ChronoLocal::new(TIMESTAMP_FORMAT.to_string()))
        .finish())
}

/// Install file logging as the default for the current thread.
///
/// Logging stays active until the returned guard is dropped.
pub fn init_file_logging(config: &LogConfig) -> Result<DefaultGuard> {
    let level = parse_level(&config.level)?;
    let subscriber = file_subscriber(&config.path, level)?;
    Ok(tracing::subscriber::set_default(subscriber))
}
