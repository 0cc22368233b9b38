//! Tracing subscriber setup for the binary.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable holding the log filter, checked before `RUST_LOG`.
pub const LOG_ENV: &str = "CONVERGE_LOG";

/// Builds the filter from [`LOG_ENV`], then `RUST_LOG`, then `default`.
#[must_use]
pub fn filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default))
}

/// Installs the global subscriber, logging to stderr so stdout carries only
/// command output. Later calls are no-ops.
pub fn init(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let installed = tracing_subscriber::registry()
        .with(filter(default))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
    if let Err(e) = installed {
        tracing::debug!("keeping the existing subscriber: {e}");
    }
}
