//! # Inbound Ports (Driving Ports)
//!
//! The rollup runtime delivers inputs one at a time in index order and
//! waits for each outcome before fetching the next.

use crate::domain::CallOutcome;
use shared_types::BlockMetadata;

/// Entry point of a rollup application.
pub trait RollupApp {
    /// Handles a state-changing input.
    fn advance(&mut self, metadata: BlockMetadata, payload: &[u8]) -> CallOutcome;

    /// Handles a read-only query.
    fn inspect(&mut self, payload: &[u8]) -> CallOutcome;
}
