//! # Error Types
//!
//! Errors raised by index queries and index stores.

use shared_types::StorageError;
use thiserror::Error;

/// Index errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    /// `order_by` names a field entries cannot be sorted by.
    #[error("unknown order field: {0}")]
    UnknownOrderField(String),

    /// `order_dir` is neither `asc` nor `desc`.
    #[error("invalid order direction: {0}")]
    InvalidOrderDir(String),

    /// `page` or `page_size` is zero.
    #[error("invalid page parameters: {0}")]
    InvalidPage(String),

    /// Underlying store failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}
