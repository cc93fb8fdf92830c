//! Log bring-up
//!
//! Every component logs through `tracing`. Output goes to a rolling file
//! (plain text or JSON lines) and, in text mode, to stdout with color.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::{EnvFilter, Layer, fmt, prelude::*};

use crate::config::AppConfig;

/// Install the global subscriber.
///
/// Keep the returned guard alive for the whole process; dropping it stops
/// the non-blocking writer and loses buffered lines.
pub fn init_logging(config: &AppConfig) -> WorkerGuard {
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender(config));

    // RUST_LOG wins over the configured default level.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let file_layer = if config.use_json {
        fmt::layer()
            .json()
            .with_writer(file_writer)
            .with_ansi(false)
            .boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_writer(file_writer)
            .with_ansi(false)
            .boxed()
    };

    // JSON mode is meant for collectors; skip the human stdout echo there.
    let stdout_layer = (!config.use_json).then(|| fmt::layer().with_target(false).boxed());

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    guard
}

fn file_appender(config: &AppConfig) -> RollingFileAppender {
    match config.rotation.as_str() {
        "hourly" => tracing_appender::rolling::hourly(&config.log_dir, &config.log_file),
        "daily" => tracing_appender::rolling::daily(&config.log_dir, &config.log_file),
        _ => tracing_appender::rolling::never(&config.log_dir, &config.log_file),
    }
}
