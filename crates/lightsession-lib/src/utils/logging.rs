//! One-time installation of the `tracing` subscriber.
//!
//! Library code only emits events; binaries and tests call [`init`] (or
//! [`init_with_default`]) to see them. The filter is read from `RUST_LOG` and
//! falls back to the given default directive. Output goes to stderr so stdout
//! stays free for JSON results.

use std::sync::Once;

use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Install the subscriber with a default level of `warn`.
pub fn init() {
    init_with_default("warn");
}

/// Install the subscriber, using `default_directive` when `RUST_LOG` is unset
/// or invalid. Later calls are no-ops.
pub fn init_with_default(default_directive: &str) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directive));
        // Another subscriber may already be installed (e.g. by a test harness).
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    });
}
