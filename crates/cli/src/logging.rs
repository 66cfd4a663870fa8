//! Dual-sink logging setup.
//!
//! Every stage banner, mirrored command line and failure report is written
//! both to the terminal and to an append-only log file, so a failed run is
//! diagnosable from the log alone after the process has exited. The file
//! sink always records at `debug`; the terminal stays at `info` unless
//! `--verbose` is given.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::LOG_FILE_NAME;

/// Initialise the terminal and file sinks.
///
/// Returns the path of the log file.
///
/// # Errors
///
/// Returns an error if the log directory or file cannot be created.
pub fn init(log_dir: &Path, verbose: bool) -> Result<PathBuf> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let log_path = log_dir.join(LOG_FILE_NAME);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_target(false)
        .with_writer(Mutex::new(file))
        .with_filter(EnvFilter::new("debug"));

    let terminal_layer = fmt::layer()
        .with_target(false)
        .with_filter(EnvFilter::new(if verbose { "debug" } else { "info" }));

    tracing_subscriber::registry()
        .with(file_layer)
        .with(terminal_layer)
        .init();

    Ok(log_path)
}
