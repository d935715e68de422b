//! # History Telemetry
//!
//! Observability for the Portal History node.
//!
//! ## Components
//!
//! - **Logging**: `tracing-subscriber` with an env filter and pretty or JSON output
//! - **Metrics**: Prometheus counters and gauges for content admission and gossip
//!
//! ## Usage
//!
//! ```rust,ignore
//! use history_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! let _guard = init_telemetry(&config).expect("Failed to init telemetry");
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `PH_SERVICE_NAME` | `portal-history` | Service name in logs |
//! | `PH_LOG_LEVEL` | `info` | Log level filter (falls back to `RUST_LOG`) |
//! | `PH_JSON_LOGS` | `false` | Emit JSON formatted logs |
//! | `PH_NETWORK` | `mainnet` | Network label attached to startup logs |

mod config;
pub mod metrics;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use metrics::{
    gather_text, register_metrics, MetricsHandle, ACCUMULATOR_HEIGHT, BACKFILL_DROPPED,
    BACKFILL_LOOKUPS, CONTENT_ADDED, CONTENT_REJECTED, EPOCHS_SEALED, GOSSIP_KEYS_OFFERED,
    GOSSIP_OFFERS,
};
pub use tracing_setup::{init_tracing, TracingGuard};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging and metrics.
///
/// Returns a guard that should be held for the lifetime of the node.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics = register_metrics()?;
    let tracing = init_tracing(config)?;

    Ok(TelemetryGuard {
        _tracing: tracing,
        _metrics: metrics,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    _tracing: TracingGuard,
    _metrics: MetricsHandle,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry");
    }
}
