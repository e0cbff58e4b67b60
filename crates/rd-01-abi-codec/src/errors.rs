//! # Error Types
//!
//! All error types for ABI encoding and decoding.

use thiserror::Error;

/// Errors raised while building descriptors or converting payloads.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbiError {
    /// Type string could not be parsed.
    #[error("invalid abi type: {0}")]
    InvalidType(String),

    /// Value does not fit the declared type.
    #[error("type mismatch for {field}: expected {expected}")]
    TypeMismatch { field: String, expected: String },

    /// Data ended before the value was complete.
    #[error("data too short: need {needed} bytes, have {available}")]
    DataTooShort { needed: usize, available: usize },

    /// Offset or length word does not fit in memory.
    #[error("invalid offset or length: {0}")]
    InvalidOffset(String),

    /// Word is not a canonical encoding of its type.
    #[error("non-canonical encoding of {0}")]
    NonCanonical(String),

    /// String field is not valid UTF-8.
    #[error("invalid utf-8 in string field")]
    InvalidUtf8,

    /// Required field absent from the payload.
    #[error("missing field: {0}")]
    MissingField(String),

    /// Descriptor declares the same field twice.
    #[error("duplicate field: {0}")]
    DuplicateField(String),

    /// Layout cannot be expressed with packed encoding.
    #[error("unsupported packed layout: {0}")]
    UnsupportedPacked(String),
}
