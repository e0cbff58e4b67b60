//! # Error Types
//!
//! Defines error types used across crates.

use thiserror::Error;

/// Errors raised by a transactional storage collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// `begin` was called while a transaction is already open.
    #[error("transaction already in progress")]
    TransactionInProgress,

    /// `commit`/`rollback` was called without an open transaction.
    #[error("no transaction in progress")]
    NoTransaction,

    /// Underlying I/O failed.
    #[error("storage I/O error: {0}")]
    Io(String),

    /// Persisted data could not be decoded.
    #[error("storage corruption: {0}")]
    Corrupted(String),
}
