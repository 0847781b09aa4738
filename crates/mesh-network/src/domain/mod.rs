//! # Domain Layer
//!
//! Peer handles and the routing table. No sockets: everything
//! here is driven through the `Connection` port.

pub mod peer;
pub mod routing_table;

pub use peer::{Peer, PeerSummary};
pub use routing_table::{RoutingTable, Table};
