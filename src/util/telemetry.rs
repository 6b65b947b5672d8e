//! Telemetry helpers for structured logging.

use tracing_subscriber::EnvFilter;

/// Install a default env-filtered subscriber (`RUST_LOG`, falling back to
/// `info`). Does nothing if a subscriber is already installed.
pub fn init_tracing() {
    init_tracing_with("info");
}

/// Like [`init_tracing`], with `default_directive` used when `RUST_LOG` is
/// unset or invalid.
pub fn init_tracing_with(default_directive: &str) {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
