//! Telemetry helpers for applications embedding `chart-option-rs`.
//!
//! Tracing setup stays explicit and opt-in. Hosts either call
//! `init_default_tracing` / `init_tracing_with_filter` or wire their own
//! `tracing` subscriber and filters.

/// Default directive: this crate at `info`, everything else at the
/// subscriber's default.
pub const DEFAULT_FILTER: &str = "chart_option=info";

/// Initializes a compact `tracing` subscriber when the `telemetry` feature is
/// enabled, honoring `RUST_LOG` and falling back to [`DEFAULT_FILTER`].
///
/// Returns `false` when the feature is disabled or a global subscriber was
/// already set by the host application.
#[must_use]
pub fn init_default_tracing() -> bool {
    #[cfg(feature = "telemetry")]
    {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_FILTER));
        return install(filter);
    }

    #[cfg(not(feature = "telemetry"))]
    {
        false
    }
}

/// Initializes a subscriber with explicit filter directives, e.g.
/// `"chart_option::api=debug"`. Returns `false` when the directives do not
/// parse, the feature is disabled, or a subscriber is already installed.
#[must_use]
pub fn init_tracing_with_filter(directives: &str) -> bool {
    #[cfg(feature = "telemetry")]
    {
        return match tracing_subscriber::EnvFilter::try_new(directives) {
            Ok(filter) => install(filter),
            Err(_) => false,
        };
    }

    #[cfg(not(feature = "telemetry"))]
    {
        let _ = directives;
        false
    }
}

#[cfg(feature = "telemetry")]
fn install(filter: tracing_subscriber::EnvFilter) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init()
        .is_ok()
}
