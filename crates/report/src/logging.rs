//! Logging setup for the dossier tools
//!
//! Logs to stderr, and optionally to a daily-rolling file.

use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LOG_FILE_PREFIX: &str = "dossier.log";

/// Filter used when `RUST_LOG` is unset
pub fn default_filter(level: &str) -> String {
    format!("warn,dossier_core={0},dossier_report={0},dossier={0}", level)
}

/// Initialize logging. `RUST_LOG` overrides `level`.
///
/// With a `log_dir`, returns a guard that must be held for the lifetime of
/// the process so buffered file logs are flushed.
pub fn init_logging(level: &str, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(level)));

    match log_dir {
        Some(dir) => {
            // Ensure log directory exists
            std::fs::create_dir_all(dir).ok();

            let file_appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
                .with(fmt::layer().with_writer(std::io::stderr).with_ansi(true))
                .try_init()
                .ok();

            tracing::debug!("Logging initialized, log directory: {:?}", dir);
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr).with_ansi(true))
                .try_init()
                .ok();
            None
        }
    }
}

/// Default log directory path
pub fn get_log_dir() -> PathBuf {
    // Use platform-appropriate app data directory
    if let Some(data_dir) = dirs::data_local_dir() {
        return data_dir.join("dossier").join("logs");
    }

    // Fallback to home directory
    if let Some(home) = dirs::home_dir() {
        return home.join(".dossier").join("logs");
    }

    // Last resort
    PathBuf::from("./dossier_logs")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_dir_is_deterministic() {
        let dir1 = get_log_dir();
        let dir2 = get_log_dir();
        assert_eq!(dir1, dir2, "Log directory should be deterministic");
        assert!(dir1.ends_with("logs"));
    }

    #[test]
    fn test_default_filter_targets_workspace_crates() {
        let filter = default_filter("debug");
        assert!(filter.starts_with("warn,"));
        assert!(filter.contains("dossier_core=debug"));
        assert!(filter.contains("dossier_report=debug"));
        assert!(filter.parse::<EnvFilter>().is_ok());
    }
}
