//! # Peer-Mesh Test Suite
//!
//! Unified test crate for behaviour that spans crates and real sockets.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── end_to_end.rs   # Two nodes over loopback TCP
//!     ├── admission.rs    # max_peers enforcement
//!     ├── identity.rs     # Identity collisions
//!     └── shutdown.rs     # close() and its aftermath
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p mesh-tests
//! cargo test -p mesh-tests integration::shutdown::
//! ```

#![allow(dead_code)]

pub mod integration;
