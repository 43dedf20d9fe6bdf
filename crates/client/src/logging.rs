//! Tracing setup: a per-session log file plus optional stderr output.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::ClientConfig;

/// Installs the global subscriber.
///
/// Logs go to `<log_dir>/<session_id>/client.log`. The filter comes from
/// `RUST_LOG` and defaults to `info`. Keep the returned guard alive until
/// exit or buffered lines are lost.
pub fn setup_logging(config: &ClientConfig) -> Result<WorkerGuard> {
    let session_id = config
        .session_id
        .clone()
        .unwrap_or_else(|| format!("session_{}", config.seed_or_clock()));
    let session_dir = config
        .log_dir
        .clone()
        .unwrap_or_else(default_log_dir)
        .join(&session_id);
    std::fs::create_dir_all(&session_dir)
        .with_context(|| format!("creating log directory {}", session_dir.display()))?;

    let file_appender = tracing_appender::rolling::never(&session_dir, "client.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false);
    let stderr_layer = config.log_to_stderr.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .boxed()
    });

    tracing_subscriber::registry()
        .with(env_filter())
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .context("installing tracing subscriber")?;

    tracing::info!(session = %session_id, log = %log_file(&session_dir).display(), "logging initialized");
    Ok(guard)
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn log_file(session_dir: &Path) -> PathBuf {
    session_dir.join("client.log")
}

/// Platform cache directory, e.g. `~/.cache/divinity/logs` on Linux.
fn default_log_dir() -> PathBuf {
    ProjectDirs::from("", "", "divinity")
        .map(|dirs| dirs.cache_dir().join("logs"))
        .unwrap_or_else(|| std::env::temp_dir().join("divinity").join("logs"))
}
