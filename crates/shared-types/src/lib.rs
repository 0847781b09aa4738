//! # Shared Types Crate
//!
//! Types shared by `shared-bus` and `mesh-network`.
//!
//! ## Design Principles
//!
//! - **Address-derived identity**: a `PeerId` is the textual form of the
//!   remote socket address of one connection.
//! - **Absolute deadlines**: idle timeouts are expressed as an `Instant`
//!   computed from "now", refreshed after each successful read or write.

pub mod deadline;
pub mod entities;

pub use deadline::{future_deadline, remaining};
pub use entities::{ConnectionDirection, PeerId};
