//! Logging setup: stdout plus a size-rotated file.
//!
//! The log lives at `<config dir>/pressure/pressure.log` and rotates at
//! 10 MB, keeping one old file. `DEBUG_LOGGING=1` turns on debug output for
//! the pressure crates.

use std::path::PathBuf;

use rolling_file::{BasicRollingFileAppender, RollingConditionBasic};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

const LOG_FILE: &str = "pressure.log";
const MAX_LOG_BYTES: u64 = 10 * 1024 * 1024;

fn filter(debug_logging: bool) -> EnvFilter {
    EnvFilter::new(if debug_logging {
        "info,pressure=debug,pressure_core=debug,pressure_overlay=debug"
    } else {
        "info"
    })
}

fn log_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(pressure_core::config::APP_NAME))
}

/// Install the global subscriber.
///
/// Hold the returned guard until exit so buffered file output is flushed.
/// `None` means the file could not be opened and only stdout is logged.
pub fn init() -> Option<WorkerGuard> {
    let debug_logging = std::env::var("DEBUG_LOGGING").is_ok();

    let Some(log_dir) = log_dir() else {
        init_stdout_only(debug_logging);
        return None;
    };

    // Subscriber is not installed yet, so failures here go to stderr
    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!("Failed to create log directory {log_dir:?}: {e}, logging to stdout only");
        init_stdout_only(debug_logging);
        return None;
    }

    let log_path = log_dir.join(LOG_FILE);
    let appender = match BasicRollingFileAppender::new(
        &log_path,
        RollingConditionBasic::new().max_size(MAX_LOG_BYTES),
        1,
    ) {
        Ok(appender) => appender,
        Err(e) => {
            eprintln!("Failed to open log file {log_path:?}: {e}, logging to stdout only");
            init_stdout_only(debug_logging);
            return None;
        }
    };
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_span_events(FmtSpan::NONE),
        )
        .with(
            fmt::layer()
                .with_writer(std::io::stdout)
                .with_target(true)
                .with_span_events(FmtSpan::NONE),
        )
        .with(filter(debug_logging))
        .init();

    tracing::info!(log_file = ?log_path, debug_logging, "Logging initialized");
    Some(guard)
}

fn init_stdout_only(debug_logging: bool) {
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stdout)
                .with_target(true)
                .with_span_events(FmtSpan::NONE),
        )
        .with(filter(debug_logging))
        .init();

    tracing::info!(debug_logging, "Logging initialized (stdout only)");
}
