//! # In-Memory Key-Value Store

use super::overlay::Overlay;
use crate::ports::outbound::{KeyValueStore, ScanResult};
use shared_types::{StorageError, Transactional};

/// Volatile transactional key-value store.
#[derive(Debug, Default)]
pub struct InMemoryKVStore {
    data: Overlay,
}

impl InMemoryKVStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed keys.
    #[must_use]
    pub fn committed_len(&self) -> usize {
        self.data.committed().len()
    }
}

impl Transactional for InMemoryKVStore {
    fn begin(&mut self) -> Result<(), StorageError> {
        self.data.begin()
    }

    fn commit(&mut self) -> Result<(), StorageError> {
        self.data.commit().map(|_| ())
    }

    fn rollback(&mut self) -> Result<(), StorageError> {
        self.data.rollback().map(|_| ())
    }

    fn in_transaction(&self) -> bool {
        self.data.in_tx()
    }
}

impl KeyValueStore for InMemoryKVStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.data.get(key))
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        self.data.put(key, value)
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), StorageError> {
        self.data.delete(key)
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<ScanResult, StorageError> {
        Ok(self.data.prefix_scan(prefix))
    }
}
