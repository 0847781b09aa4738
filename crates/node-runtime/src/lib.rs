//! # Node Runtime Library
//!
//! This library exposes the internal modules of the node runtime for testing.
//! The main entry point is the `main.rs` binary.
//!
//! - `cli` - command-line arguments
//! - `config` - TOML file loading with environment and flag overrides
//! - `runtime` - runs one node and its event consumer

#![warn(missing_docs)]

pub mod cli;
pub mod config;
pub mod runtime;

pub use cli::Args;
pub use config::{load_config, NodeConfig};
pub use runtime::NodeRuntime;
