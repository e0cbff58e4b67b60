//! # Node Runtime Library
//!
//! Host-mode plumbing for rollup-dispatch applications. The executable in
//! `main.rs` wires these pieces together:
//!
//! - `config` - engine and logging configuration from file and environment
//! - `logging` - `tracing-subscriber` installation
//! - `channel` - JSON-lines rollup output channel
//! - `driver` - JSON-lines request loop over any `RollupApp`
//! - `echo` - demo application

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod channel;
pub mod config;
pub mod driver;
pub mod echo;
pub mod logging;

pub use channel::{JsonLinesRollup, OutputLine};
pub use config::{LogSettings, RuntimeConfig};
pub use driver::{run, DriverSummary, RollupRequest};
