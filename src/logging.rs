//! Tracing setup for the classifier.
//!
//! Human-readable events go to stderr so stdout carries only the JSON outcome.
//! An optional per-launch file additionally records when each `classify`
//! span closes, so every request id gets a line with its busy and idle time.

use std::{
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
    sync::OnceLock,
    time::SystemTime,
};

use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, UtcOffset, format_description::FormatItem, macros::format_description};
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{EnvFilter, Registry, fmt, fmt::format::FmtSpan, prelude::*};

use crate::app_dirs;

/// Environment variable that overrides the configured filter, e.g. `cryscope=debug`.
pub const LOG_ENV_VAR: &str = "CRYSCOPE_LOG";
const LOG_FILE_PREFIX: &str = "cryscope_";
const DEFAULT_LEVEL: &str = "info";
const MAX_RETAINED_FILES: usize = 100;

static LOG_GUARD: OnceLock<Option<WorkerGuard>> = OnceLock::new();

/// `[logging]` section of the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// `EnvFilter` directive used when `CRYSCOPE_LOG` is unset.
    #[serde(default = "default_level")]
    pub level: String,
    /// Also write a log file under the app `logs` directory.
    #[serde(default = "default_file")]
    pub file: bool,
    /// Number of `cryscope_*.log` files kept after startup.
    #[serde(default = "default_retained_files")]
    pub retained_files: usize,
}

fn default_level() -> String {
    DEFAULT_LEVEL.to_string()
}

fn default_file() -> bool {
    true
}

fn default_retained_files() -> usize {
    10
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            file: default_file(),
            retained_files: default_retained_files(),
        }
    }
}

impl LoggingSettings {
    pub(crate) fn normalized(mut self) -> Self {
        self.retained_files = self.retained_files.clamp(1, MAX_RETAINED_FILES);
        if self.level.trim().is_empty() {
            self.level = default_level();
        }
        self
    }
}

/// Errors that may occur while initializing logging.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Failed to prepare log directory: {0}")]
    Dir(#[from] app_dirs::AppDirError),
    #[error("Failed to read log directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to remove old log file {path}: {source}")]
    RemoveFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to format log filename time: {0}")]
    FormatTime(time::error::Format),
    #[error("Failed to install global tracing subscriber: {0}")]
    SetGlobal(tracing::subscriber::SetGlobalDefaultError),
    #[error("Failed to create log file at {path}: {source}")]
    CreateLogFile {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Install the global subscriber. Later calls are no-ops.
///
/// Errors are returned rather than aborting so the CLI can still classify
/// without logs.
pub fn init(settings: &LoggingSettings) -> Result<(), LoggingError> {
    if LOG_GUARD.get().is_some() {
        return Ok(());
    }
    let directive = filter_directive(std::env::var(LOG_ENV_VAR).ok(), &settings.level);
    let timer = build_timer();

    let (file_layer, guard, log_path) = if settings.file {
        let log_dir = app_dirs::logs_dir()?;
        let log_file_name = format_log_file_name(now_local_or_utc())?;
        let log_path = log_dir.join(&log_file_name);
        ensure_file_exists(&log_path)?;
        prune_old_logs(&log_dir, settings.retained_files.max(1))?;

        let (writer, guard) = tracing_appender::non_blocking(rolling::never(&log_dir, log_file_name));
        let layer = fmt::layer()
            .with_ansi(false)
            .with_timer(timer.clone())
            .with_thread_names(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_writer(writer);
        (Some(layer), Some(guard), Some(log_path))
    } else {
        (None, None, None)
    };

    let stderr_layer = fmt::layer()
        .with_timer(timer)
        .with_target(false)
        .with_writer(std::io::stderr);

    let subscriber = Registry::default()
        .with(build_env_filter(&directive))
        .with(stderr_layer)
        .with(file_layer);
    tracing::subscriber::set_global_default(subscriber).map_err(LoggingError::SetGlobal)?;
    let _ = LOG_GUARD.set(guard);

    match log_path {
        Some(path) => tracing::debug!(filter = %directive, "Logging to {}", path.display()),
        None => tracing::debug!(filter = %directive, "File logging disabled"),
    }
    Ok(())
}

/// `CRYSCOPE_LOG` wins over the configured level when it is set and non-empty.
fn filter_directive(env_override: Option<String>, configured: &str) -> String {
    env_override
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| configured.trim().to_string())
}

fn build_env_filter(directive: &str) -> EnvFilter {
    EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL))
}

fn ensure_file_exists(path: &Path) -> Result<(), LoggingError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map(|_| ())
        .map_err(|source| LoggingError::CreateLogFile {
            path: path.to_path_buf(),
            source,
        })
}

fn is_own_log_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
        return false;
    };
    name.starts_with(LOG_FILE_PREFIX) && name.ends_with(".log")
}

/// Remove the oldest `cryscope_*.log` files beyond `keep`; other files are left alone.
fn prune_old_logs(dir: &Path, keep: usize) -> Result<(), LoggingError> {
    let mut logs: Vec<(SystemTime, PathBuf)> = fs::read_dir(dir)
        .map_err(|source| LoggingError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_ok_and(|kind| kind.is_file()))
        .filter(|entry| is_own_log_file(&entry.path()))
        .map(|entry| {
            let modified = entry
                .metadata()
                .and_then(|meta| meta.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            (modified, entry.path())
        })
        .collect();

    // Newest first; ties broken by name so same-second launches prune deterministically.
    logs.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.cmp(&a.1)));
    for (_, path) in logs.into_iter().skip(keep) {
        fs::remove_file(&path).map_err(|source| LoggingError::RemoveFile { path, source })?;
    }
    Ok(())
}

fn format_log_file_name(now: OffsetDateTime) -> Result<String, LoggingError> {
    const NAME_FORMAT: &[FormatItem<'_>] =
        format_description!("[year][month][day]T[hour][minute][second]");
    let stamp = now.format(NAME_FORMAT).map_err(LoggingError::FormatTime)?;
    Ok(format!("{LOG_FILE_PREFIX}{stamp}_{}.log", std::process::id()))
}

fn build_timer() -> fmt::time::OffsetTime<time::format_description::BorrowedFormatItem<'static>> {
    const DISPLAY_FORMAT: &[FormatItem<'static>] =
        format_description!("[hour]:[minute]:[second].[subsecond digits:3]");
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    fmt::time::OffsetTime::new(offset, DISPLAY_FORMAT.into())
}

fn now_local_or_utc() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}
