// src/observability/mod.rs
//! Logging setup
//!
//! The harness logs through `tracing` and counts loads through `metrics`:
//!
//! - `harness_loads_total`: harness loads started
//! - `harness_load_failures_total`: harness loads that returned an error
//! - `harness_mock_hits_total`: requires answered by a mock module
//! - `harness_process_exit_total`: intercepted `process.exit` calls
//!
//! No metrics recorder is installed here; counters are no-ops until the
//! embedding test binary installs one.

use crate::utils::config::LogSettings;
use tracing_subscriber::EnvFilter;

/// Install a global `tracing` subscriber
///
/// `RUST_LOG` takes precedence over the configured level. Returns `false`
/// when a subscriber was already installed, which is common in test binaries.
pub fn init_tracing(settings: &LogSettings) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let installed = if settings.json {
        builder.json().try_init().is_ok()
    } else {
        builder.try_init().is_ok()
    };

    if installed {
        tracing::debug!("Tracing initialized at level {}", settings.level);
    }
    installed
}
