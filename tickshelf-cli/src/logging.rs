//! Tracing setup: human-readable stderr plus an append-only log file.

use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Name of the durable log inside the configured log directory.
pub const LOG_FILE: &str = "tickshelf_sync.log";

/// Install the global subscriber.
///
/// Filter precedence: `--log-level`, then `RUST_LOG`, then `info`.
pub fn init_logging(log_dir: Option<&Path>, level: Option<&str>) -> Result<()> {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level).with_context(|| format!("bad log level {level}"))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

    let file_layer = match log_dir {
        Some(dir) => {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create log dir {}", dir.display()))?;
            let path = dir.join(LOG_FILE);
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("tracing already initialised")?;
    Ok(())
}
