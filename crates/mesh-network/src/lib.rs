//! # Mesh Network
//!
//! Connection management for a peer-to-peer node: an accept loop and dialer
//! feed admitted peers into a concurrent routing table, one watch worker per
//! peer turns incoming frames into signals, and everything the node observes
//! reaches the consumer as one ordered stream.
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture with:
//! - **Domain Layer:** `Peer` handles and the `RoutingTable`
//! - **Ports Layer:** the `Connection` trait every transport implements
//! - **Adapters Layer:** `TcpConnection` (length-prefixed frames)
//! - **Node:** the orchestrator wiring domain, adapters and the event bus
//!
//! ## Example
//!
//! ```rust,ignore
//! use mesh_network::{NetworkConfig, Node};
//! use tokio_util::sync::CancellationToken;
//!
//! let node = Node::new(NetworkConfig::default())?;
//! let mut events = node.events(CancellationToken::new());
//!
//! let listener = tokio::spawn({
//!     let node = node.clone();
//!     async move { node.listen("127.0.0.1:7000").await }
//! });
//!
//! let peer = node.dial("127.0.0.1:7001").await?;
//! node.send_message(&peer, b"hello").await?;
//!
//! node.close().await?;
//! ```

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod node;
pub mod ports;

/// Test utilities.
/// Requires feature: `test-utils`
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-exports for convenience
pub use adapters::TcpConnection;
pub use config::{ConfigError, NetworkConfig};
pub use domain::{Peer, PeerSummary, RoutingTable};
pub use error::NetworkError;
pub use node::{Node, ShutdownReport};
pub use ports::Connection;

pub use shared_bus::{EventKind, Signal};
pub use shared_types::{ConnectionDirection, PeerId};
