//! # Output Shaping
//!
//! Normalization of handler results into bytes, and the framing rules of
//! the output ceilings.
//!
//! | Ceiling | Applies to |
//! |---------|------------|
//! | `MAX_OUTPUT_SIZE` | every wire frame; notices and vouchers as a whole |
//! | `MAX_AGGREGATED_OUTPUT_SIZE` | logical report before framing |
//! | `MAX_SPLITTABLE_OUTPUT_SIZE` | one `part` of a splittable query result |

use crate::errors::DispatchError;
use rd_01_abi_codec::prelude::{selector, AbiPayload, Payload, PayloadDescriptor, Selector};
use rd_02_query_codec::prelude::payload_to_json;
use serde_json::Value;
use shared_types::{
    hex_to_bytes, u256_to_word, OutputFormat, CONTINUATION_MARKER, MAX_AGGREGATED_OUTPUT_SIZE,
    MAX_SPLITTABLE_OUTPUT_SIZE, U256,
};

// =============================================================================
// OUTPUT DATA
// =============================================================================

/// Anything a handler may emit.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputData {
    /// Raw bytes, sent as-is.
    Bytes(Vec<u8>),
    /// Integer, sent as one 32-byte word.
    Int(U256),
    /// Text; `0x`-prefixed hex is decoded, anything else is sent as UTF-8.
    Text(String),
    /// JSON document, sent as compact text.
    Json(Value),
    /// Structured payload, encoded per the module's output format.
    Model {
        /// Layout of `payload`.
        descriptor: PayloadDescriptor,
        /// Field values.
        payload: Payload,
    },
}

impl OutputData {
    /// Wraps a typed payload.
    pub fn model<P: AbiPayload>(value: &P) -> Self {
        Self::Model {
            descriptor: P::descriptor(),
            payload: value.to_payload(),
        }
    }

    /// Class name recorded in index entries.
    #[must_use]
    pub fn class_name(&self) -> String {
        match self {
            Self::Bytes(_) => "bytes".into(),
            Self::Int(_) => "int".into(),
            Self::Text(_) => "str".into(),
            Self::Json(_) => "json".into(),
            Self::Model { descriptor, .. } => descriptor.name().to_string(),
        }
    }

    /// Selector of a model's own signature, `name(types)`.
    #[must_use]
    pub fn model_selector(&self) -> Option<Selector> {
        match self {
            Self::Model { descriptor, .. } => Some(selector(&descriptor.signature(descriptor.name()))),
            _ => None,
        }
    }

    /// Bytes to send. `format` only affects models.
    pub fn encode(&self, format: OutputFormat) -> Result<Vec<u8>, DispatchError> {
        match self {
            Self::Bytes(b) => Ok(b.clone()),
            Self::Int(v) => Ok(u256_to_word(*v).to_vec()),
            Self::Text(s) if s.starts_with("0x") => {
                hex_to_bytes(s).map_err(|e| DispatchError::handler(e.to_string()))
            }
            Self::Text(s) => Ok(s.as_bytes().to_vec()),
            Self::Json(v) => {
                serde_json::to_vec(v).map_err(|e| DispatchError::handler(e.to_string()))
            }
            Self::Model {
                descriptor,
                payload,
            } => {
                let encoded = match format {
                    OutputFormat::Abi => descriptor.encode(payload),
                    OutputFormat::PackedAbi => descriptor.encode_packed(payload),
                    OutputFormat::Json => {
                        return serde_json::to_vec(&payload_to_json(&payload.project(descriptor)))
                            .map_err(|e| DispatchError::handler(e.to_string()))
                    }
                };
                encoded.map_err(|e| DispatchError::handler(format!("{}: {e}", descriptor.name())))
            }
        }
    }
}

impl From<Vec<u8>> for OutputData {
    fn from(b: Vec<u8>) -> Self {
        Self::Bytes(b)
    }
}

impl From<&[u8]> for OutputData {
    fn from(b: &[u8]) -> Self {
        Self::Bytes(b.to_vec())
    }
}

impl From<String> for OutputData {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for OutputData {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<U256> for OutputData {
    fn from(v: U256) -> Self {
        Self::Int(v)
    }
}

impl From<u64> for OutputData {
    fn from(v: u64) -> Self {
        Self::Int(U256::from(v))
    }
}

impl From<Value> for OutputData {
    fn from(v: Value) -> Self {
        Self::Json(v)
    }
}

// =============================================================================
// FRAMING
// =============================================================================

/// Splits `payload` into frames of at most `max` bytes. An empty payload
/// is one empty frame.
#[must_use]
pub fn frames(payload: &[u8], max: usize) -> Vec<&[u8]> {
    if payload.is_empty() {
        vec![payload]
    } else {
        payload.chunks(max.max(1)).collect()
    }
}

/// Caps a logical report at `MAX_AGGREGATED_OUTPUT_SIZE`. Returns true if
/// bytes were cut.
pub fn truncate_aggregated(payload: &mut Vec<u8>) -> bool {
    if payload.len() > MAX_AGGREGATED_OUTPUT_SIZE {
        payload.truncate(MAX_AGGREGATED_OUTPUT_SIZE);
        true
    } else {
        false
    }
}

/// Part `part` of a splittable result: bytes `[part*S, (part+1)*S)`,
/// followed by the continuation marker when more data remains.
#[must_use]
pub fn split_part(payload: &[u8], part: usize) -> Vec<u8> {
    let start = part.saturating_mul(MAX_SPLITTABLE_OUTPUT_SIZE).min(payload.len());
    let end = start.saturating_add(MAX_SPLITTABLE_OUTPUT_SIZE).min(payload.len());
    let mut chunk = payload[start..end].to_vec();
    if payload.len() > end {
        chunk.push(CONTINUATION_MARKER);
    }
    chunk
}
