//! # Telemetry
//!
//! Structured logging setup shared by every binary that embeds the engine.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "info,comanda=debug,sqlx=warn";

/// Installs the global `tracing` subscriber.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=comanda_service=trace` - Trace the service crate only
/// - Default: [`DEFAULT_FILTER`]
///
/// Returns `false` if a subscriber was already installed (e.g. by a test
/// harness or the host application); the existing one is kept.
pub fn init_tracing() -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_ok()
}
