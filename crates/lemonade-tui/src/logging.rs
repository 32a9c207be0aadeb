use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;
use anyhow::{anyhow, Context, Result};
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "lemonade_core=info,lemonade_tui=info";

/// Send tracing output to a log file; the terminal belongs to the UI.
/// Returns the log file path.
pub fn init() -> Result<PathBuf> {
    let log_dir = dirs::cache_dir()
        .ok_or_else(|| anyhow!("Could not determine cache directory"))?
        .join("lemonade-chat");
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory {:?}", log_dir))?;

    let log_path = log_dir.join("lemonade-chat.log");
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {:?}", log_path))?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))?;

    Ok(log_path)
}
