//! Log file setup
//!
//! stdout carries the wire protocol and stderr is usually the agent's
//! terminal, so logs go to a file. The location is `AGENTUI_LOG_FILE` when
//! set, otherwise `agentui/agentui.log` under the XDG state directory.

use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

/// Environment variable overriding the log file path
pub const LOG_FILE_ENV: &str = "AGENTUI_LOG_FILE";

const DEFAULT_FILTER: &str = "agentui_tui=info,agentui_core=info";

/// Default log file path
#[must_use]
pub fn default_log_path() -> PathBuf {
    dirs::state_dir()
        .or_else(dirs::cache_dir)
        .or_else(dirs::home_dir)
        .unwrap_or_else(std::env::temp_dir)
        .join("agentui")
        .join("agentui.log")
}

/// Install the global subscriber
///
/// `RUST_LOG` overrides the default filter. Returns the path being written.
pub fn init() -> anyhow::Result<PathBuf> {
    let path = std::env::var_os(LOG_FILE_ENV).map_or_else(default_log_path, PathBuf::from);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("opening log file {}", path.display()))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|e| anyhow::anyhow!("installing log subscriber: {e}"))?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_path_ends_in_agentui_log() {
        let path = default_log_path();
        assert!(path.ends_with("agentui/agentui.log"));
    }
}
