//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the logging subsystem
//! - Configure log level via the environment (RUST_LOG)

use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the global tracing subscriber.
///
/// `default_level` applies when RUST_LOG is unset, e.g. `"info"` or
/// `"conduit_rpc=debug"`. Safe to call more than once; later calls are
/// no-ops.
pub fn init(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.to_string()));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
