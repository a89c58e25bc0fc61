//! Logging infrastructure.
//!
//! This module provides:
//! - Per-job loggers with file + host callback dual output
//! - Compact mode with progress filtering
//! - Tail buffer of external tool output for error reports
//! - Integration with the `tracing` ecosystem
//!
//! # Example
//!
//! ```no_run
//! use s2d_core::logging::{JobLogger, LogConfig};
//!
//! let logger = JobLogger::new("tween_10-11", "/path/to/logs", LogConfig::default(), None).unwrap();
//!
//! logger.stage("Exporting");
//! logger.command("ffmpeg -y -i interp.mp4 -vf fps=8 frame%03d.png");
//! logger.progress(50);
//! logger.success("Sequence published");
//! ```

mod job_logger;
mod types;

pub use job_logger::JobLogger;
pub use types::{LogCallback, LogConfig, LogLevel, MessagePrefix};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` wins over `default_level`. Output goes to stderr. Calling it
/// again (a host reloading the add-on) is a no-op.
pub fn init_tracing(default_level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.as_str()));

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .with(filter)
        .try_init();
}

/// Initialize tracing for tests (only logs warnings and above).
#[cfg(test)]
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_twice_is_harmless() {
        init_test_tracing();
        init_tracing(LogLevel::Debug);
        init_tracing(LogLevel::Info);
    }
}
