//! Synthetic Traffic Generator
//!
//! Visits a list of URLs with isolated Chrome browser sessions, performs
//! randomized interactions (scrolling, clicking) on each page, and records
//! per-visit telemetry into a JSON dataset.

pub mod browser;
pub mod config;
pub mod stats;
pub mod storage;
pub mod traffic;

use std::path::PathBuf;

/// Get the log file directory, if file logging is enabled.
///
/// File logging is opt-in via the `TRAFFICGEN_LOG_DIR` environment variable;
/// without it only the console layer is installed.
pub fn log_dir() -> Option<PathBuf> {
    std::env::var_os("TRAFFICGEN_LOG_DIR").map(PathBuf::from)
}

/// Initialize the tracing subscriber (console layer, plus a daily-rolling
/// file layer when a log directory is configured).
///
/// Returns the appender guard which must be kept alive for the duration of
/// the process so buffered log lines are flushed on exit.
pub fn init_logging() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false);

    if let Some(log_dir) = log_dir() {
        let _ = std::fs::create_dir_all(&log_dir);
        let file_appender = tracing_appender::rolling::daily(&log_dir, "trafficgen.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(true)
            .with_writer(non_blocking);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .with(file_layer)
            .init();

        Some(guard)
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .init();

        None
    }
}
