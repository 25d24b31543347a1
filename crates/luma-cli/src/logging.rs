//! Log output for the CLI.
//!
//! Engine events are written to stderr so they never mix with rendered
//! templates on stdout.

use std::io;

use tracing::subscriber;
use tracing_subscriber::EnvFilter;

use crate::config::LogLevel;

fn filter_for(level: LogLevel) -> EnvFilter {
    EnvFilter::new(level.as_filter_str())
}

/// Install the global subscriber.
///
/// A subscriber that is already installed wins; the error from a second
/// installation is ignored.
pub fn init_logging(level: LogLevel) {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter_for(level))
        .with_writer(io::stderr)
        .with_target(true)
        .without_time()
        .finish();

    let _ = subscriber::set_global_default(subscriber);
}
