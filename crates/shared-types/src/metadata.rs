//! # Rollup Metadata
//!
//! Block metadata delivered by the rollup runtime with every advance input.
//! Inspect inputs carry no metadata at all.

use crate::value_objects::Address;
use serde::{Deserialize, Serialize};

/// Metadata attached to an advance (state-changing) input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockMetadata {
    /// Chain the application contract lives on.
    #[serde(default)]
    pub chain_id: u64,
    /// Application contract address, when the runtime supplies it.
    #[serde(default)]
    pub app_contract: Option<Address>,
    /// Address that submitted the input.
    pub msg_sender: Address,
    /// Base-layer block in which the input was added.
    pub block_number: u64,
    /// Timestamp of that block (seconds).
    pub block_timestamp: u64,
    /// Epoch the input belongs to.
    #[serde(default)]
    pub epoch_index: u64,
    /// Sequential index of the input.
    pub input_index: u64,
}

impl BlockMetadata {
    /// Metadata with the fields every advance needs; the rest default to zero.
    #[must_use]
    pub fn new(msg_sender: Address, input_index: u64, block_number: u64, timestamp: u64) -> Self {
        Self {
            chain_id: 0,
            app_contract: None,
            msg_sender,
            block_number,
            block_timestamp: timestamp,
            epoch_index: 0,
            input_index,
        }
    }

    /// Sets the application contract address.
    #[must_use]
    pub fn with_app_contract(mut self, app_contract: Address) -> Self {
        self.app_contract = Some(app_contract);
        self
    }
}
