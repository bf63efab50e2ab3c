//! Logging and tracing configuration
//!
//! One-shot commands log compactly to stderr. The long-running relay modes
//! (`watch`, `bridge`) also log to a file, since `bridge` owns stdout and
//! `watch` redraws the terminal.

use std::path::PathBuf;
use tracing_subscriber::{
    fmt::{self, writer::MakeWriterExt},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use super::paths;

/// Initialize tracing for one-shot CLI commands (stderr logging)
///
/// Logs are controlled by the `RUST_LOG` environment variable.
/// Default level is INFO for this crate, WARN for dependencies.
pub fn init_cli() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("decoy_remote=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}

/// Initialize tracing for the relay (file + stderr logging)
///
/// The relay logs to both:
/// 1. A log file at `<data dir>/decoy-remote/logs/relay.log`
/// 2. stderr, at WARN and above only, so terminal output stays readable
///
/// Log level controlled by `RUST_LOG`, default is DEBUG for this crate to
/// capture every poll.
pub fn init_relay() -> Option<PathBuf> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("decoy_remote=debug,info"));

    if let Some(log_file) = relay_log_path() {
        let opened = log_file
            .parent()
            .map(std::fs::create_dir_all)
            .transpose()
            .and_then(|_| {
                std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&log_file)
            });

        match opened {
            Ok(file) => {
                let file_layer = fmt::layer()
                    .with_writer(file)
                    .with_ansi(false)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true);

                let stderr_layer = fmt::layer()
                    .with_writer(std::io::stderr.with_max_level(tracing::Level::WARN))
                    .with_target(false)
                    .compact();

                tracing_subscriber::registry()
                    .with(filter)
                    .with(file_layer)
                    .with(stderr_layer)
                    .init();

                return Some(log_file);
            }
            Err(e) => {
                eprintln!("Warning: Could not open log file: {}", e);
            }
        }
    }

    // Fallback: stderr only
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .compact(),
        )
        .init();

    None
}

/// Get the path to the relay log file
pub fn relay_log_path() -> Option<PathBuf> {
    paths::log_dir().map(|d| d.join("relay.log"))
}
