/// Tracing subscriber setup
///
/// Plain CLI commands log to stderr. The TUI owns the terminal, so in that
/// mode log lines go to `<cache_dir>/smartcity-dash/dashboard.log` instead.

use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

use crate::utils::APP_NAME;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    File,
}

pub fn log_file_path() -> Result<PathBuf> {
    let dir = dirs::cache_dir()
        .or_else(|| Some(std::env::temp_dir()))
        .context("Could not determine a log directory")?
        .join(APP_NAME);

    fs::create_dir_all(&dir).context("Failed to create log directory")?;
    Ok(dir.join("dashboard.log"))
}

/// `RUST_LOG` wins; otherwise `warn`, or `debug` for this crate with `verbose`
fn env_filter(verbose: bool) -> EnvFilter {
    let default = if verbose { "warn,smartcity_dash=debug" } else { "warn" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

pub fn init(verbose: bool, json: bool, target: LogTarget) -> Result<()> {
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter(verbose));

    let result = match (target, json) {
        (LogTarget::Stderr, false) => builder.with_writer(std::io::stderr).try_init(),
        (LogTarget::Stderr, true) => builder.json().with_writer(std::io::stderr).try_init(),
        (LogTarget::File, json) => {
            let path = log_file_path()?;
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            let builder = builder.with_ansi(false).with_writer(Mutex::new(file));

            if json {
                builder.json().try_init()
            } else {
                builder.try_init()
            }
        }
    };

    // A second init (e.g. from tests) keeps the first subscriber
    if let Err(e) = result {
        tracing::debug!(error = %e, "tracing subscriber already installed");
    }

    Ok(())
}
