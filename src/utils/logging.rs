// src/utils/logging.rs
//! Logging configuration
//!
//! Sets up `env_logger` for the service and for one-shot probe runs. Both
//! share the same line format: `[ts level module:line] message`.

use env_logger::{Builder, Target};
use log::LevelFilter;
use std::env;

/// Initializes logging for the long-running service
///
/// # Configuration
/// - Logs to stdout
/// - Default log level: Info
/// - `RUST_LOG` overrides the default when set
pub fn init_logging() {
    init_with_default(LevelFilter::Info);
}

/// Initializes logging for `probe` runs
///
/// Probes print their results to stdout themselves, so the default level is
/// Warn to keep adapter chatter out of the report.
pub fn init_probe_logging() {
    init_with_default(LevelFilter::Warn);
}

fn init_with_default(level: LevelFilter) {
    let mut builder = common_log_config();

    if env::var("RUST_LOG").is_err() {
        builder.filter_level(level);
    } else {
        builder.parse_env("RUST_LOG");
    }

    // A second init (tests, embedding) is harmless.
    let _ = builder.try_init();
}

/// Creates a base logger builder with the shared line format
///
/// # Returns
/// Partially configured `env_logger::Builder` instance
fn common_log_config() -> Builder {
    let mut builder = Builder::new();

    builder
        .format(|buf, record| {
            use std::io::Write;
            let ts = buf.timestamp_seconds();
            let level = record.level();
            let module = record.module_path().unwrap_or_default();
            let line = record.line().unwrap_or(0);

            writeln!(
                buf,
                "[{} {} {}:{}] {}",
                ts,
                level,
                module,
                line,
                record.args()
            )
        })
        .target(Target::Stdout);

    builder
}
