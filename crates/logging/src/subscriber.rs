//! crates/logging/src/subscriber.rs
//! Installation of the global tracing subscriber.

use std::io;

use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use super::config::LoggingConfig;

/// Installs a stderr subscriber filtered by `config`.
///
/// Returns `false` when a global subscriber was already installed, which
/// happens when several commands run inside one test process.
pub fn init_tracing(config: &LoggingConfig) -> bool {
    let layer = fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .without_time();

    tracing_subscriber::registry()
        .with(config.filter())
        .with(layer)
        .try_init()
        .is_ok()
}
