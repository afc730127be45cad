//! Tracing setup: a plain-text log file plus an `RUST_LOG`-driven stderr layer.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Install the global subscriber. Keep the guard alive until exit so the
/// file writer flushes.
pub fn init(log_file: &Path, verbose: bool) -> Result<WorkerGuard> {
    let (dir, name) = split_log_path(log_file)?;
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("cannot create log directory {}", dir.display()))?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(name)
        .build(&dir)
        .with_context(|| format!("cannot open log file {}", log_file.display()))?;
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);

    let file_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    // Terminal stays clean unless RUST_LOG asks for more
    let stderr_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(file_level),
        )
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_filter(stderr_filter),
        )
        .try_init()
        .context("logging already initialized")?;

    tracing::debug!(path = %log_file.display(), verbose, "logging initialized");
    Ok(guard)
}

fn split_log_path(log_file: &Path) -> Result<(PathBuf, String)> {
    let name = log_file
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("invalid log file path: {}", log_file.display()))?
        .to_string();

    let dir = match log_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    Ok((dir, name))
}
