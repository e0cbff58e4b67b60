//! # Error Types
//!
//! Query decoding errors and their JSON-RPC error codes.

use rd_01_abi_codec::errors::AbiError;
use thiserror::Error;

/// JSON-RPC 2.0 error codes.
pub mod codes {
    /// Invalid JSON.
    pub const PARSE_ERROR: i32 = -32700;
    /// Not a valid request object.
    pub const INVALID_REQUEST: i32 = -32600;
    /// Method does not exist.
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Invalid method parameters.
    pub const INVALID_PARAMS: i32 = -32602;
    /// Internal error.
    pub const INTERNAL_ERROR: i32 = -32603;
}

/// Errors raised while parsing or binding a query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// Payload is not valid JSON (or not valid UTF-8).
    #[error("parse error: {0}")]
    Parse(String),

    /// Request object is malformed (missing `method`, `id`, bad `params`).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// No route answers this path or method name.
    #[error("method not found: {0}")]
    MethodNotFound(String),

    /// A required parameter is absent.
    #[error("missing param: {0}")]
    MissingParam(String),

    /// A parameter could not be coerced to its declared type.
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    /// Request format differs from the module's configured format.
    #[error("format mismatch: module expects {expected}, got {actual}")]
    FormatMismatch { expected: String, actual: String },

    /// Payload could not be converted by the ABI layer.
    #[error(transparent)]
    Abi(#[from] AbiError),
}

impl QueryError {
    /// The JSON-RPC error code for this error.
    #[must_use]
    pub fn rpc_code(&self) -> i32 {
        match self {
            Self::Parse(_) => codes::PARSE_ERROR,
            Self::InvalidRequest(_) | Self::FormatMismatch { .. } => codes::INVALID_REQUEST,
            Self::MethodNotFound(_) => codes::METHOD_NOT_FOUND,
            Self::MissingParam(_) | Self::InvalidValue { .. } => codes::INVALID_PARAMS,
            Self::Abi(_) => codes::INTERNAL_ERROR,
        }
    }

    /// Shorthand for [`QueryError::InvalidValue`].
    pub fn invalid_value(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}
