//! # Ports
//!
//! Driving port (the rollup runtime feeding inputs) and driven ports (the
//! rollup output channel and the application key-value store).

pub mod inbound;
pub mod outbound;

pub use inbound::RollupApp;
pub use outbound::{KeyValueStore, RollupChannel};
