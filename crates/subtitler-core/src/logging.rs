//! Logging setup
//!
//! `tracing` subscriber with an env filter, a console (stderr) layer and an optional
//! daily-rolling file layer.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Log file name inside the log directory (rotated daily)
pub const LOG_FILE_NAME: &str = "subtitler.log";

/// Installs the global subscriber.
///
/// The filter defaults to `info` and honors `RUST_LOG`. When `log_dir` is
/// given, logs are also written there; the returned guard must be held for
/// as long as file logging should flush. Calling this again is a no-op.
pub fn init_logging(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(cfg!(debug_assertions));

    let (file_layer, guard) = match log_dir.filter(|dir| std::fs::create_dir_all(dir).is_ok()) {
        Some(dir) => {
            let file_appender = tracing_appender::rolling::daily(dir, LOG_FILE_NAME);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer);

    // Already initialized (tests, repeated calls).
    let _ = tracing::subscriber::set_global_default(subscriber);
    guard
}
