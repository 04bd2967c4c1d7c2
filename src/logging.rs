//! Tracing setup. Logs go to stderr so stdout stays machine-readable.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber; `RUST_LOG` overrides the default filter.
///
/// Debug builds log cook activity; release builds only warnings and errors.
pub fn init() {
    let default_filter = if cfg!(debug_assertions) {
        "kitchen_sim=debug"
    } else {
        "kitchen_sim=warn"
    };

    // A second init (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_thread_names(true),
        )
        .try_init();
}
