//! Committed map plus the pending writes of the open transaction.

use crate::ports::outbound::ScanResult;
use shared_types::StorageError;
use std::collections::BTreeMap;

/// `None` in `pending` is a pending delete.
#[derive(Debug, Default)]
pub(crate) struct Overlay {
    committed: BTreeMap<Vec<u8>, Vec<u8>>,
    pending: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
    in_tx: bool,
}

impl Overlay {
    pub(crate) fn with_committed(committed: BTreeMap<Vec<u8>, Vec<u8>>) -> Self {
        Self {
            committed,
            ..Self::default()
        }
    }

    pub(crate) fn committed(&self) -> &BTreeMap<Vec<u8>, Vec<u8>> {
        &self.committed
    }

    pub(crate) fn in_tx(&self) -> bool {
        self.in_tx
    }

    pub(crate) fn begin(&mut self) -> Result<(), StorageError> {
        if self.in_tx {
            return Err(StorageError::TransactionInProgress);
        }
        self.in_tx = true;
        Ok(())
    }

    /// Applies pending writes. Returns the number of keys touched.
    pub(crate) fn commit(&mut self) -> Result<usize, StorageError> {
        self.require_tx()?;
        let touched = self.pending.len();
        for (key, value) in std::mem::take(&mut self.pending) {
            match value {
                Some(v) => {
                    self.committed.insert(key, v);
                }
                None => {
                    self.committed.remove(&key);
                }
            }
        }
        self.in_tx = false;
        Ok(touched)
    }

    /// Discards pending writes. Returns the number of keys discarded.
    pub(crate) fn rollback(&mut self) -> Result<usize, StorageError> {
        self.require_tx()?;
        let discarded = self.pending.len();
        self.pending.clear();
        self.in_tx = false;
        Ok(discarded)
    }

    pub(crate) fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        match self.pending.get(key) {
            Some(pending) => pending.clone(),
            None => self.committed.get(key).cloned(),
        }
    }

    pub(crate) fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        self.require_tx()?;
        self.pending.insert(key.to_vec(), Some(value.to_vec()));
        Ok(())
    }

    pub(crate) fn delete(&mut self, key: &[u8]) -> Result<(), StorageError> {
        self.require_tx()?;
        self.pending.insert(key.to_vec(), None);
        Ok(())
    }

    pub(crate) fn prefix_scan(&self, prefix: &[u8]) -> ScanResult {
        let mut merged: BTreeMap<&[u8], &[u8]> = self
            .committed
            .iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.as_slice(), v.as_slice()))
            .collect();
        for (k, v) in self.pending.iter().filter(|(k, _)| k.starts_with(prefix)) {
            match v {
                Some(v) => {
                    merged.insert(k.as_slice(), v.as_slice());
                }
                None => {
                    merged.remove(k.as_slice());
                }
            }
        }
        merged
            .into_iter()
            .map(|(k, v)| (k.to_vec(), v.to_vec()))
            .collect()
    }

    fn require_tx(&self) -> Result<(), StorageError> {
        if self.in_tx {
            Ok(())
        } else {
            Err(StorageError::NoTransaction)
        }
    }
}
