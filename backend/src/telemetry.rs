use tracing_subscriber::{prelude::*, EnvFilter};

use crate::config::Environment;

/// Installs the global subscriber. `RUST_LOG` overrides the default filter.
/// Production logs are JSON, development logs are human readable.
///
/// Calling it twice is harmless; the second install is ignored.
pub fn init_tracing(environment: &Environment) {
    let is_production = environment.is_production();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if is_production {
            EnvFilter::new("info,tower_http=info")
        } else {
            EnvFilter::new("debug,tower_http=debug")
        }
    });

    let registry = tracing_subscriber::registry().with(filter);
    let result = if is_production {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(false)
                    .with_current_span(true),
            )
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init()
    };

    if result.is_ok() {
        tracing::debug!(production = is_production, "tracing initialized");
    }
}
