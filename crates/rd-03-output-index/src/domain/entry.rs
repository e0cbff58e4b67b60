//! # Index Entries

use serde::{Deserialize, Serialize};
use shared_types::{Address, BlockMetadata, OutputKind, U256};
use std::collections::BTreeSet;

/// One indexed input or output.
///
/// Append-only: the only mutation after creation is the one-time back-fill
/// of `app_contract`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Store-assigned sequence number (insertion order).
    pub id: u64,
    /// Input, report, notice or voucher.
    #[serde(rename = "type")]
    pub kind: OutputKind,
    /// Module that produced it.
    pub module: String,
    /// Payload type name.
    pub class_name: String,
    /// Sender of the input that produced it.
    pub msg_sender: Address,
    /// Block number of that input.
    pub block_number: u64,
    /// Block timestamp of that input.
    pub timestamp: u64,
    /// Epoch of that input.
    pub epoch_index: u64,
    /// Index of that input.
    pub input_index: u64,
    /// Position among outputs of the same kind for that input (outputs only).
    pub output_index: Option<u64>,
    /// Free-form labels.
    pub tags: BTreeSet<String>,
    /// Caller-supplied numeric value.
    pub value: Option<U256>,
    /// Transfer value of a voucher.
    pub voucher_value: Option<U256>,
    /// Application contract, once known.
    pub app_contract: Option<Address>,
}

impl IndexEntry {
    /// Entry for `kind` produced while handling the input described by `metadata`.
    pub fn new(
        kind: OutputKind,
        module: impl Into<String>,
        class_name: impl Into<String>,
        metadata: &BlockMetadata,
    ) -> Self {
        Self {
            id: 0,
            kind,
            module: module.into(),
            class_name: class_name.into(),
            msg_sender: metadata.msg_sender,
            block_number: metadata.block_number,
            timestamp: metadata.block_timestamp,
            epoch_index: metadata.epoch_index,
            input_index: metadata.input_index,
            output_index: None,
            tags: BTreeSet::new(),
            value: None,
            voucher_value: None,
            app_contract: metadata.app_contract,
        }
    }

    /// Sets the output position.
    #[must_use]
    pub fn with_output_index(mut self, output_index: u64) -> Self {
        self.output_index = Some(output_index);
        self
    }

    /// Adds tags.
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Sets the numeric value.
    #[must_use]
    pub fn with_value(mut self, value: Option<U256>) -> Self {
        self.value = value;
        self
    }

    /// Sets the voucher transfer value.
    #[must_use]
    pub fn with_voucher_value(mut self, value: U256) -> Self {
        self.voucher_value = Some(value);
        self
    }

    /// Sets the application contract if not already known.
    #[must_use]
    pub fn with_app_contract(mut self, app_contract: Option<Address>) -> Self {
        if self.app_contract.is_none() {
            self.app_contract = app_contract;
        }
        self
    }
}
