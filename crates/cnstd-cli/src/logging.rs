//! Logging system initialization.
//!
//! Console output goes to stderr. An optional log file gets its own level
//! and is written through a non-blocking appender.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Console level when neither `-v`, `RUST_LOG` nor the config set one.
const DEFAULT_LEVEL: &str = "warn";

/// Resolved logging options.
#[derive(Debug, Clone, Default)]
pub struct LogSettings {
    /// Number of `-v` flags.
    pub verbose: u8,
    /// `[logging] level` from the config.
    pub level: Option<String>,
    /// Log file path.
    pub file: Option<PathBuf>,
    /// Level for the log file; defaults to the console directive.
    pub file_level: Option<String>,
}

impl LogSettings {
    /// Filter directive for the console.
    ///
    /// `-v` wins, then `RUST_LOG`, then the configured level.
    #[must_use]
    pub fn console_directive(&self, rust_log: Option<&str>) -> String {
        match self.verbose {
            0 => rust_log
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .or_else(|| self.level.clone())
                .unwrap_or_else(|| DEFAULT_LEVEL.to_string()),
            1 => "info".to_string(),
            2 => "debug".to_string(),
            _ => "trace".to_string(),
        }
    }

    /// Filter directive for the log file.
    #[must_use]
    pub fn file_directive(&self, rust_log: Option<&str>) -> String {
        self.file_level
            .clone()
            .unwrap_or_else(|| self.console_directive(rust_log))
    }
}

/// Installs the global subscriber.
///
/// The returned guard flushes the log file when dropped and must be kept
/// alive until the program exits.
///
/// # Errors
///
/// Returns an error if the log file cannot be opened or a subscriber is
/// already installed.
pub fn init_logging(settings: &LogSettings) -> Result<Option<WorkerGuard>> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let console_filter = EnvFilter::new(settings.console_directive(rust_log.as_deref()));

    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_file(true)
        .with_line_number(true)
        .with_filter(console_filter);

    let (file_layer, guard) = match &settings.file {
        Some(path) => {
            let file = open_log_file(path)?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_file(true)
                .with_line_number(true)
                .with_filter(EnvFilter::new(settings.file_directive(rust_log.as_deref())));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file_layer)
        .try_init()
        .context("Failed to install logger")?;

    Ok(guard)
}

/// Opens `path` for appending, creating its parent directory.
fn open_log_file(path: &Path) -> Result<std::fs::File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))
}
