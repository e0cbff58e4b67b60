//! # Ports
//!
//! Storage interface the dispatcher writes index entries through.

pub mod outbound;

pub use outbound::IndexStore;
