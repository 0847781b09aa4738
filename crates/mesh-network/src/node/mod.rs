//! # Node
//!
//! The orchestrator. It owns the routing table and the event bus, runs the
//! accept loop, dials, and spawns one watch worker per admitted peer.
//!
//! ## Lifecycle
//!
//! ```text
//! listen ──► accept ──┐
//!                     ├──► establish ──► admit ──► PeerConnected ──► watch
//! dial ──► connect ───┘                                               │
//!                                  MessageReceived ◄── frame ◄────────┤
//!                                 PeerDisconnected ◄── error ◄────────┘
//! ```
//!
//! `close` flips the closed flag once, closes every peer, publishes the
//! node-closed signal and stops every loop.

// Semantic submodules
mod connect;
mod core;
mod shutdown;
mod watch;

// Re-export public API
pub use self::core::Node;
pub use self::shutdown::ShutdownReport;
