//! Tracing subscriber setup for binaries.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "info,parlor=debug";

/// Installs the global tracing subscriber.
///
/// Use `RUST_LOG` to configure, e.g.:
/// `RUST_LOG=debug,parlor_room=trace`
///
/// Libraries never call this; a second call is a no-op.
pub fn init() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init();
}
