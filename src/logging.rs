//! Logging Module
//!
//! Structured logging with file output for diagnostics.

use std::path::PathBuf;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize logging.
///
/// Diagnostics always go to a daily rolling file under the data directory;
/// they are echoed to stderr only with `--verbose`, keeping stdout clean for
/// command output. `RUST_LOG` overrides the default filter.
pub fn init(verbose: bool) {
    let log_dir = get_log_directory();

    let _ = std::fs::create_dir_all(&log_dir);

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "vaxbook.log");

    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_writer(file_appender);

    let console_layer = if verbose {
        Some(fmt::layer().with_target(false).with_writer(std::io::stderr))
    } else {
        None
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug,hyper=warn,reqwest=warn")
        } else {
            EnvFilter::new("info,hyper=warn,reqwest=warn")
        }
    });

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer);

    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn get_log_directory() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("vaxbook")
        .join("logs")
}
