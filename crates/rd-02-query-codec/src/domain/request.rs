//! # Structured Requests
//!
//! `{"method": "module_method", "params": [...] | {...}}` and its JSON-RPC
//! variant, which additionally requires `"jsonrpc": "2.0"` and an `id`
//! that is echoed back in the response envelope.

use super::json::{payload_to_json, payload_to_json_array};
use super::params::ParamBag;
use crate::errors::QueryError;
use rd_01_abi_codec::prelude::{Payload, PayloadDescriptor};
use serde_json::{json, Map, Value};

/// Positional or named request parameters.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RequestParams {
    /// No `params` member.
    #[default]
    None,
    /// `params` is an array.
    Positional(Vec<Value>),
    /// `params` is an object.
    Named(Map<String, Value>),
}

impl RequestParams {
    /// Converts to a bag bound against `descriptor` (positional values are
    /// matched to its fields in declaration order).
    pub fn to_bag(&self, descriptor: &PayloadDescriptor) -> Result<ParamBag, QueryError> {
        match self {
            Self::None => Ok(ParamBag::new()),
            Self::Positional(values) => ParamBag::from_positional(descriptor, values),
            Self::Named(obj) => Ok(ParamBag::from_json_object(obj)),
        }
    }
}

/// A parsed structured request.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredRequest {
    /// `module_method`.
    pub method: String,
    /// Request parameters.
    pub params: RequestParams,
    /// JSON-RPC id, present only for JSON-RPC requests.
    pub id: Option<Value>,
}

impl StructuredRequest {
    /// Parses a structured request; with `rpc` set, `jsonrpc` and `id` are
    /// required.
    pub fn parse(raw: &[u8], rpc: bool) -> Result<Self, QueryError> {
        let value: Value =
            serde_json::from_slice(raw).map_err(|e| QueryError::Parse(e.to_string()))?;
        let Value::Object(obj) = value else {
            return Err(QueryError::InvalidRequest("request must be an object".into()));
        };

        let method = match obj.get("method") {
            Some(Value::String(m)) if !m.is_empty() => m.clone(),
            Some(_) => return Err(QueryError::InvalidRequest("method must be a string".into())),
            None => return Err(QueryError::InvalidRequest("missing method field".into())),
        };

        let params = match obj.get("params") {
            None | Some(Value::Null) => RequestParams::None,
            Some(Value::Array(items)) => RequestParams::Positional(items.clone()),
            Some(Value::Object(map)) => RequestParams::Named(map.clone()),
            Some(_) => {
                return Err(QueryError::InvalidRequest(
                    "params must be array or object".into(),
                ))
            }
        };

        let id = if rpc {
            match obj.get("jsonrpc") {
                Some(Value::String(v)) if v == "2.0" => {}
                Some(_) => return Err(QueryError::InvalidRequest("jsonrpc must be \"2.0\"".into())),
                None => return Err(QueryError::InvalidRequest("missing jsonrpc field".into())),
            }
            match obj.get("id") {
                Some(id @ (Value::String(_) | Value::Number(_))) => Some(id.clone()),
                Some(_) => {
                    return Err(QueryError::InvalidRequest(
                        "id must be string or number".into(),
                    ))
                }
                None => return Err(QueryError::InvalidRequest("missing id field".into())),
            }
        } else {
            None
        };

        Ok(Self { method, params, id })
    }

    /// Extracts the id of a raw JSON-RPC request without validating the rest,
    /// so errors can still be answered against it.
    #[must_use]
    pub fn peek_id(raw: &[u8]) -> Option<Value> {
        let value: Value = serde_json::from_slice(raw).ok()?;
        value.get("id").cloned()
    }
}

/// Structured method name of a route.
#[must_use]
pub fn method_name(module: &str, method: &str) -> String {
    format!("{module}_{method}")
}

/// Encodes a structured request with named params.
#[must_use]
pub fn encode_json_query(module: &str, method: &str, payload: &Payload) -> String {
    json!({
        "method": method_name(module, method),
        "params": payload_to_json(payload),
    })
    .to_string()
}

/// Encodes a JSON-RPC request for a route whose parameters are laid out by
/// `shape`.
///
/// Params are positional, in `shape` order, while the supplied fields form
/// a prefix of it. A gap left by an omitted optional field switches to
/// named params so later values are not shifted onto the wrong field.
#[must_use]
pub fn encode_jsonrpc_query(
    module: &str,
    method: &str,
    shape: &PayloadDescriptor,
    payload: &Payload,
    id: u64,
) -> String {
    let ordered = payload.project(shape);
    let prefix = shape
        .fields()
        .iter()
        .take_while(|f| ordered.contains(&f.name))
        .count();
    let params = if prefix == ordered.len() {
        payload_to_json_array(&ordered)
    } else {
        payload_to_json(&ordered)
    };
    json!({
        "jsonrpc": "2.0",
        "method": method_name(module, method),
        "params": params,
        "id": id,
    })
    .to_string()
}
