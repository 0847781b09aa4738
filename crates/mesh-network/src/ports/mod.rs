//! # Ports Layer
//!
//! Traits at the boundary between the node and its transports.
//!
//! - **Driven Ports (Outbound):** `Connection`, the peer handle contract every
//!   transport adapter implements.

pub mod outbound;

pub use outbound::Connection;
