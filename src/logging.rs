//! Tracing setup for the audit binary.
//!
//! Diagnostics go to stderr so stdout carries only the report. Each audit run
//! also appends to its own timestamped file under the app logs directory.
//! When that directory is unusable, [`init_stderr_only`] keeps warnings
//! visible.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::OnceLock,
    time::SystemTime,
};

use time::{
    OffsetDateTime, UtcOffset, format_description::BorrowedFormatItem, macros::format_description,
};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*};

use crate::app_dirs;

/// Audit log files kept in the logs directory, newest first.
const RETAINED_RUN_LOGS: usize = 10;
const RUN_LOG_PREFIX: &str = "media_hygiene_";

static FILE_WRITER_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Log directory unavailable: {0}")]
    AppDir(#[from] app_dirs::AppDirError),
    #[error("Failed to {action} {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to name run log: {0}")]
    FormatTime(#[from] time::error::Format),
    #[error("A tracing subscriber is already installed")]
    AlreadyInstalled(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Install the stderr and per-run file subscriber, returning the run log path.
pub fn init() -> Result<PathBuf, LoggingError> {
    let log_dir = app_dirs::logs_dir()?;
    let run_log = log_dir.join(run_log_name(now_local_or_utc())?);
    fs::File::create(&run_log).map_err(|source| LoggingError::Io {
        action: "create run log",
        path: run_log.clone(),
        source,
    })?;
    let file_name = run_log
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_default();
    let appender = tracing_appender::rolling::never(&log_dir, file_name);
    let (file_writer, guard) = tracing_appender::non_blocking(appender);
    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_timer(file_timer())
        .with_writer(file_writer);

    tracing::subscriber::set_global_default(
        Registry::default()
            .with(env_filter())
            .with(stderr_layer())
            .with(file_layer),
    )?;
    let _ = FILE_WRITER_GUARD.set(guard);
    prune_run_logs(&log_dir, RETAINED_RUN_LOGS);
    tracing::debug!(path = %run_log.display(), "Run log opened");
    Ok(run_log)
}

/// Install a stderr-only subscriber. Used when [`init`] fails.
pub fn init_stderr_only() -> Result<(), LoggingError> {
    tracing::subscriber::set_global_default(
        Registry::default().with(env_filter()).with(stderr_layer()),
    )?;
    Ok(())
}

fn stderr_layer<S>() -> impl tracing_subscriber::Layer<S>
where
    S: tracing::Subscriber + for<'span> tracing_subscriber::registry::LookupSpan<'span>,
{
    fmt::layer()
        .without_time()
        .with_target(false)
        .with_writer(std::io::stderr)
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn file_timer() -> fmt::time::OffsetTime<BorrowedFormatItem<'static>> {
    const STAMP: &[BorrowedFormatItem<'static>] =
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    fmt::time::OffsetTime::new(offset, STAMP.into())
}

fn now_local_or_utc() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

fn run_log_name(started: OffsetDateTime) -> Result<String, LoggingError> {
    const STAMP: &[BorrowedFormatItem<'_>] =
        format_description!("[year]-[month]-[day]_[hour]-[minute]-[second]");
    Ok(format!("{RUN_LOG_PREFIX}{}.log", started.format(STAMP)?))
}

fn is_run_log(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with(RUN_LOG_PREFIX) && name.ends_with(".log"))
}

/// Delete the oldest run logs beyond `keep`. Other files are left alone.
fn prune_run_logs(dir: &Path, keep: usize) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    let mut logs: Vec<(SystemTime, PathBuf)> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_run_log(path))
        .map(|path| {
            let modified = fs::metadata(&path)
                .and_then(|meta| meta.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            (modified, path)
        })
        .collect();
    logs.sort();
    let excess = logs.len().saturating_sub(keep);
    for (_, path) in logs.into_iter().take(excess) {
        if let Err(err) = fs::remove_file(&path) {
            tracing::warn!(path = %path.display(), error = %err, "Could not remove old run log");
        }
    }
}
