//! Debug logging behind `--verbose`

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;

const LOG_FILE_NAME: &str = "beehive-chat.log";

/// Where log lines go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    /// Append to `<dir>/beehive-chat.log`
    File(PathBuf),
}

impl LogTarget {
    /// The chat UI draws on the terminal, so it logs to `~/.beehive/` instead.
    /// One-shot commands log to stderr.
    pub fn for_mode(interactive: bool) -> Self {
        match (interactive, dirs::home_dir()) {
            (true, Some(home)) => LogTarget::File(home.join(".beehive")),
            (true, None) => LogTarget::File(std::env::temp_dir()),
            (false, _) => LogTarget::Stderr,
        }
    }

    pub fn file_path(&self) -> Option<PathBuf> {
        match self {
            LogTarget::Stderr => None,
            LogTarget::File(dir) => Some(dir.join(LOG_FILE_NAME)),
        }
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the default filter.
pub fn init(target: &LogTarget) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("beehive_chat=debug"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match target {
        LogTarget::Stderr => builder.with_writer(std::io::stderr).init(),
        LogTarget::File(dir) => builder
            .with_ansi(false)
            .with_writer(file_appender(dir)?)
            .init(),
    }
    Ok(())
}

fn file_appender(dir: &Path) -> Result<RollingFileAppender> {
    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(LOG_FILE_NAME)
        .build(dir)
        .with_context(|| format!("Failed to open log file in {}", dir.display()))
}
