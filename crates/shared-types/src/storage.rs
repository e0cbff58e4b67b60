//! # Transactional Storage Contract
//!
//! Every storage collaborator the dispatcher touches (the application
//! key-value store, the output index) follows the same scope discipline:
//! one `begin` per call, then exactly one of `commit` or `rollback`.
//! Only one transaction may be open at a time.

use crate::errors::StorageError;

/// Transaction scope shared by all storage collaborators.
pub trait Transactional {
    /// Opens a transaction. Fails if one is already open.
    fn begin(&mut self) -> Result<(), StorageError>;

    /// Makes every write since `begin` visible.
    fn commit(&mut self) -> Result<(), StorageError>;

    /// Discards every write since `begin`.
    fn rollback(&mut self) -> Result<(), StorageError>;

    /// Forces committed state to durable media. No-op for volatile stores.
    fn flush(&mut self) -> Result<(), StorageError> {
        Ok(())
    }

    /// Returns true while a transaction is open.
    fn in_transaction(&self) -> bool;
}
