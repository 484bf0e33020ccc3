//! Logging setup
//!
//! Thin wrappers over `tracing-subscriber`. Library code only emits
//! `tracing` events; binaries embedding the router call one of these once
//! at startup.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Initialize stderr logging, filtered by `RUST_LOG` (default `info`)
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Initialize logging to a daily-rolling file in `dir`
///
/// Returns a guard that must be held for the lifetime of the process;
/// dropping it flushes and stops the background writer.
pub fn init_logging_with_file(dir: impl AsRef<std::path::Path>) -> WorkerGuard {
    let appender = tracing_appender::rolling::daily(dir, "expert-router.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(writer)
        .with_ansi(false)
        .init();

    guard
}
