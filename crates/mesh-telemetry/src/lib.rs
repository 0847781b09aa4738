//! # Mesh Telemetry
//!
//! Observability for the peer-mesh node.
//!
//! ## Components
//!
//! - **Logging**: `tracing-subscriber` registry with an env filter and either
//!   a pretty or a JSON formatter
//! - **Metrics**: Prometheus counters and gauges for peer lifecycle and
//!   message traffic
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mesh_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     let _guard = init_telemetry(&TelemetryConfig::from_env())
//!         .expect("Failed to init telemetry");
//!     // Logs and metrics are now being collected
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `MESH_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `MESH_JSON_LOGS` | `false` | Emit JSON lines instead of pretty output |
//! | `MESH_SERVICE_NAME` | `peer-mesh` | Service name recorded at startup |

#![warn(missing_docs)]

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{encode_metrics, register_metrics, MetricsHandle};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The log subscriber could not be installed.
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    /// A metric could not be registered or encoded.
    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),
}

/// Install logging and register metrics.
///
/// Returns a guard that must be held for the lifetime of the application.
///
/// # Errors
///
/// Returns error if a global subscriber is already installed or metric
/// registration fails.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics = register_metrics()?;
    init_logging(config)?;
    Ok(TelemetryGuard { _metrics: metrics })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    _metrics: MetricsHandle,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::debug!("Telemetry shut down");
    }
}
