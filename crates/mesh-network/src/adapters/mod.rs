//! # Transport Adapters
//!
//! Production implementations of the `Connection` port.
//!
//! ## Adapters Provided
//!
//! - `TcpConnection` - length-prefixed frames over a TCP stream

/// TCP transport
pub mod tcp;

pub use tcp::{encode_frame, read_frame, TcpConnection, FRAME_HEADER_LEN};
