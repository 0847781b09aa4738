//! Prometheus metrics for the peer-mesh node.
//!
//! All metrics follow the naming convention: `mesh_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: Monotonically increasing value (e.g. messages_received_total)
//! - **Gauge**: Value that can go up or down (e.g. peers_connected)

use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // PEER METRICS
    // =========================================================================

    /// Peers currently in the routing table
    pub static ref PEERS_CONNECTED: IntGauge = IntGauge::new(
        "mesh_peers_connected",
        "Number of currently connected peers"
    ).expect("metric creation failed");

    /// Connection attempts by direction and outcome
    pub static ref PEER_CONNECTIONS: IntCounterVec = IntCounterVec::new(
        Opts::new("mesh_peer_connections_total", "Peer connection attempts"),
        &["direction", "outcome"]  // direction: inbound/outbound, outcome: accepted/rejected/failed
    ).expect("metric creation failed");

    /// Peers that left the routing table through their watch worker
    pub static ref PEER_DISCONNECTIONS: IntCounter = IntCounter::new(
        "mesh_peer_disconnections_total",
        "Total number of peer disconnections"
    ).expect("metric creation failed");

    // =========================================================================
    // TRAFFIC METRICS
    // =========================================================================

    /// Non-empty frames received from peers
    pub static ref MESSAGES_RECEIVED: IntCounter = IntCounter::new(
        "mesh_messages_received_total",
        "Total messages received from peers"
    ).expect("metric creation failed");

    /// Payload bytes received from peers
    pub static ref BYTES_RECEIVED: IntCounter = IntCounter::new(
        "mesh_bytes_received_total",
        "Total payload bytes received from peers"
    ).expect("metric creation failed");

    /// Payload bytes written to peers
    pub static ref BYTES_SENT: IntCounter = IntCounter::new(
        "mesh_bytes_sent_total",
        "Total payload bytes sent to peers"
    ).expect("metric creation failed");

    // =========================================================================
    // EVENT BUS METRICS
    // =========================================================================

    /// Signals published by kind
    pub static ref SIGNALS_PUBLISHED: IntCounterVec = IntCounterVec::new(
        Opts::new("mesh_signals_published_total", "Signals published to the event bus"),
        &["kind"]
    ).expect("metric creation failed");
}

/// Handle for the registered metrics
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the global registry.
///
/// Calling this more than once is harmless.
///
/// # Errors
///
/// Returns error if a metric conflicts with one registered elsewhere.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Peers
        Box::new(PEERS_CONNECTED.clone()),
        Box::new(PEER_CONNECTIONS.clone()),
        Box::new(PEER_DISCONNECTIONS.clone()),
        // Traffic
        Box::new(MESSAGES_RECEIVED.clone()),
        Box::new(BYTES_RECEIVED.clone()),
        Box::new(BYTES_SENT.clone()),
        // Event Bus
        Box::new(SIGNALS_PUBLISHED.clone()),
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

/// Encode all metrics as Prometheus text format.
///
/// # Errors
///
/// Returns error if encoding fails.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
