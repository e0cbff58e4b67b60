//! # Outbound Ports (Driven Ports)
//!
//! Interfaces the dispatcher depends on.
//!
//! - [`RollupChannel`]: where reports, notices and vouchers go
//! - [`KeyValueStore`]: application state, committed or rolled back with
//!   the call

use crate::errors::RollupError;
use shared_types::{StorageError, Transactional, Voucher};

/// Result of a prefix scan: `(key, value)` pairs in key order.
pub type ScanResult = Vec<(Vec<u8>, Vec<u8>)>;

/// Output side of the rollup.
pub trait RollupChannel {
    /// Sends one report frame.
    fn emit_report(&mut self, payload: &[u8]) -> Result<(), RollupError>;

    /// Sends one notice.
    fn emit_notice(&mut self, payload: &[u8]) -> Result<(), RollupError>;

    /// Sends one voucher.
    fn emit_voucher(&mut self, voucher: &Voucher) -> Result<(), RollupError>;
}

/// Transactional key-value store for application state.
///
/// Reads see the open transaction's own writes. Writes outside a
/// transaction fail with [`StorageError::NoTransaction`].
pub trait KeyValueStore: Transactional {
    /// Value stored under `key`.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError>;

    /// Stores `value` under `key`.
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), StorageError>;

    /// Removes `key`.
    fn delete(&mut self, key: &[u8]) -> Result<(), StorageError>;

    /// Returns true if `key` holds a value.
    fn exists(&self, key: &[u8]) -> Result<bool, StorageError> {
        Ok(self.get(key)?.is_some())
    }

    /// Every pair whose key starts with `prefix`.
    fn prefix_scan(&self, prefix: &[u8]) -> Result<ScanResult, StorageError>;
}
