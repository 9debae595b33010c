//! provides logging helpers

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::InitError;
use tracing_appender::rolling::RollingFileAppender;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::filter::{self};
use tracing_subscriber::fmt::layer;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry;

/// Directory for rotated log files, in addition to stderr.
pub const LOG_PATH_ENV_VAR: &str = "LOG_PATH";

const LOG_FILE_PREFIX: &str = "gpu-idle-shutdown.log";
const MAX_LOG_FILES: usize = 3;

/// initiate the global tracing subscriber
///
/// Events always go to stderr. When `log_path` is given, they are also written
/// to a daily rotated file in that directory; the returned guard must be kept
/// alive until exit so buffered lines are flushed.
pub fn init<P: AsRef<Path>>(log_path: Option<P>) -> Option<WorkerGuard> {
    let env_filter = filter::EnvFilter::builder()
        .with_default_directive(filter::LevelFilter::INFO.into())
        .from_env_lossy();

    let stderr_layer = layer().with_writer(std::io::stderr).with_target(true);

    let (appender, appender_error) = match log_path.as_ref().map(|p| file_appender(p.as_ref())) {
        Some(Ok(appender)) => (Some(appender), None),
        Some(Err(e)) => (None, Some(e)),
        None => (None, None),
    };

    let (file_layer, guard) = match appender {
        Some(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file_layer = layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true);
            (Some(file_layer), Some(guard))
        }
        None => (None, None),
    };

    registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    if let (Some(e), Some(path)) = (appender_error, log_path) {
        tracing::warn!(
            "Failed to create log file in {}, logging to stderr only: {}",
            path.as_ref().display(),
            e
        );
    }

    guard
}

fn file_appender(dir: &Path) -> Result<RollingFileAppender, InitError> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .max_log_files(MAX_LOG_FILES)
        .build(dir)
}
