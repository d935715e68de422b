//! Prometheus metrics for the Portal History node.
//!
//! All metrics follow the naming convention: `ph_<component>_<metric>_<unit>`
//!
//! Metrics are updated whether or not [`register_metrics`] has been called;
//! registration only makes them visible to [`gather_text`].

use lazy_static::lazy_static;
use prometheus::{
    Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // CONTENT ADMISSION
    // =========================================================================

    /// Content items accepted into local state, by content type
    pub static ref CONTENT_ADDED: IntCounterVec = IntCounterVec::new(
        Opts::new("ph_content_added_total", "Content items accepted"),
        &["content_type"]
    ).expect("metric creation failed");

    /// Content items dropped during validation, by content type and reason
    pub static ref CONTENT_REJECTED: IntCounterVec = IntCounterVec::new(
        Opts::new("ph_content_rejected_total", "Content items rejected by validation"),
        &["content_type", "reason"]
    ).expect("metric creation failed");

    // =========================================================================
    // ACCUMULATOR
    // =========================================================================

    /// Epochs sealed into the master accumulator
    pub static ref EPOCHS_SEALED: IntCounter = IntCounter::new(
        "ph_accumulator_epochs_sealed_total",
        "Total number of epochs sealed"
    ).expect("metric creation failed");

    /// Height of the last header admitted into the accumulator
    pub static ref ACCUMULATOR_HEIGHT: IntGauge = IntGauge::new(
        "ph_accumulator_height",
        "Height of the accumulator tip"
    ).expect("metric creation failed");

    // =========================================================================
    // GOSSIP
    // =========================================================================

    /// OFFER batches dispatched to peers
    pub static ref GOSSIP_OFFERS: IntCounter = IntCounter::new(
        "ph_gossip_offers_total",
        "Total number of offer batches dispatched"
    ).expect("metric creation failed");

    /// Content keys carried by dispatched offers
    pub static ref GOSSIP_KEYS_OFFERED: IntCounter = IntCounter::new(
        "ph_gossip_keys_offered_total",
        "Total number of content keys offered"
    ).expect("metric creation failed");

    // =========================================================================
    // BACKFILL
    // =========================================================================

    /// Backfill lookups by outcome (found, failed)
    pub static ref BACKFILL_LOOKUPS: IntCounterVec = IntCounterVec::new(
        Opts::new("ph_backfill_lookups_total", "Backfill lookups by outcome"),
        &["outcome"]
    ).expect("metric creation failed");

    /// Backfill requests dropped because the queue was full
    pub static ref BACKFILL_DROPPED: IntCounter = IntCounter::new(
        "ph_backfill_dropped_total",
        "Total number of backfill requests dropped on a full queue"
    ).expect("metric creation failed");
}

/// Handle to the registered metrics.
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the global registry.
///
/// Calling this more than once is harmless.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(CONTENT_ADDED.clone()),
        Box::new(CONTENT_REJECTED.clone()),
        Box::new(EPOCHS_SEALED.clone()),
        Box::new(ACCUMULATOR_HEIGHT.clone()),
        Box::new(GOSSIP_OFFERS.clone()),
        Box::new(GOSSIP_KEYS_OFFERED.clone()),
        Box::new(BACKFILL_LOOKUPS.clone()),
        Box::new(BACKFILL_DROPPED.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all registered metrics in the Prometheus text format.
pub fn gather_text() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
