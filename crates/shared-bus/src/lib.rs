//! # Shared Bus - Event Bus for Peer Lifecycle Signals
//!
//! Decouples producers (the node orchestrator and its per-peer watch
//! workers) from the external consumer via a bounded, ordered relay.
//!
//! ```text
//! ┌──────────────┐   publish()   ┌──────────┐  deliver()  ┌────────────┐  listen()  ┌──────────┐
//! │ watch worker │ ────────────→ │  Broker  │ ──────────→ │ Subscriber │ ─────────→ │ consumer │
//! │ accept/dial  │               │ kind→sink│             │  (queue)   │            │ channel  │
//! └──────────────┘               └──────────┘             └────────────┘            └──────────┘
//! ```
//!
//! ## Rules
//!
//! - The set of event kinds is closed (`EventKind`); every kind is wired to
//!   the default subscriber when the bus is built. There is no dynamic
//!   subscription.
//! - Publishing blocks while the subscriber queue is full. A slow consumer
//!   throttles producers instead of losing signals.
//! - Each signal reaches at most one `listen` loop. Concurrent listeners
//!   compete for signals; they are not fanned out.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod bus;
pub mod events;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use bus::EventBus;
pub use events::{EventKind, Signal};
pub use publisher::{Broker, EventPublisher, SignalSink};
pub use subscriber::{BusError, Subscriber};

/// Maximum signals buffered in the subscriber queue before publishers block.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
