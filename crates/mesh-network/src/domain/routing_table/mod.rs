//! Routing Table Implementation
//!
//! Concurrent map from peer identity to the live `Peer` handle.

mod table;

pub use table::{RoutingTable, Table};
