use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const APP_DIR: &str = "steam-presence";
const LOG_FILE: &str = "steam-presence.log";
const LOG_RETENTION_DAYS: u64 = 7;
const DEFAULT_FILTER: &str = "info,hyper=warn,reqwest=warn";

/// Console plus daily rolling file logging. Keep the returned guard alive
/// for as long as the process runs or buffered file output is lost.
pub fn init_logging() -> WorkerGuard {
    let log_dir = get_log_directory();

    let file_appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    // stdout is reserved for --dry-run output
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    let file_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false)
        .with_writer(file_writer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    tracing::info!("Logging initialized, log directory: {}", log_dir.display());
    tracing::info!("steam-presence version: {}", env!("CARGO_PKG_VERSION"));

    cleanup_old_logs(&log_dir, LOG_RETENTION_DAYS);

    guard
}

fn get_log_directory() -> PathBuf {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("logs");

    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!("Warning: Failed to create log directory: {}", e);
    }

    log_dir
}

/// Deletes rotated log files older than `keep_days`. The active file is
/// never touched.
fn cleanup_old_logs(log_dir: &Path, keep_days: u64) {
    let cutoff = SystemTime::now() - Duration::from_secs(keep_days * 24 * 60 * 60);

    let entries = match std::fs::read_dir(log_dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("Failed to read log directory for cleanup: {}", e);
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();

        let is_rotated = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| name.starts_with(LOG_FILE) && name != LOG_FILE);
        if !is_rotated {
            continue;
        }

        let Ok(modified) = entry.metadata().and_then(|m| m.modified()) else {
            continue;
        };

        if modified >= cutoff {
            continue;
        }

        match std::fs::remove_file(&path) {
            Ok(()) => tracing::debug!("Removed old log file: {:?}", path),
            Err(e) => tracing::warn!("Failed to remove old log file {:?}: {}", path, e),
        }
    }
}
