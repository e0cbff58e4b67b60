//! # JSON-RPC Response Envelope
//!
//! Reports of JSON-RPC modules are wrapped as
//! `{"jsonrpc":"2.0","result"|"error":...,"id":N}`.

use crate::errors::QueryError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON-RPC error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcErrorObject {
    /// Error code.
    pub code: i32,
    /// Human-readable message.
    pub message: String,
}

/// JSON-RPC response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    /// Always `"2.0"`.
    pub jsonrpc: String,
    /// Success value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Failure object.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcErrorObject>,
    /// Echoed request id.
    pub id: Value,
}

impl RpcResponse {
    /// Successful response.
    #[must_use]
    pub fn result(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    /// Error response.
    pub fn error(id: Value, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(RpcErrorObject {
                code,
                message: message.into(),
            }),
            id,
        }
    }

    /// Error response for a query error.
    #[must_use]
    pub fn from_query_error(id: Value, err: &QueryError) -> Self {
        Self::error(id, err.rpc_code(), err.to_string())
    }

    /// Serialized bytes.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_default()
    }
}
