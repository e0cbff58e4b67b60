//! # JSON Rendering
//!
//! Converts ABI values and payloads to JSON for JSON reports, structured
//! queries and the indexer. Integers that fit in 64 bits become JSON numbers,
//! wider ones become decimal strings; byte strings become `0x` hex.

use rd_01_abi_codec::domain::value::{twos_to_decimal, twos_to_i128};
use rd_01_abi_codec::prelude::{AbiValue, Payload};
use serde_json::{Map, Value};
use shared_types::bytes_to_hex;

/// Renders one value.
#[must_use]
pub fn value_to_json(value: &AbiValue) -> Value {
    match value {
        AbiValue::Uint(v) => {
            if v.bits() <= 64 {
                Value::from(v.as_u64())
            } else {
                Value::String(v.to_string())
            }
        }
        AbiValue::Int(word) => match twos_to_i128(*word).and_then(|v| i64::try_from(v).ok()) {
            Some(v) => Value::from(v),
            None => Value::String(twos_to_decimal(*word)),
        },
        AbiValue::Address(a) => Value::String(a.to_hex()),
        AbiValue::Bool(b) => Value::Bool(*b),
        AbiValue::FixedBytes(b) | AbiValue::Bytes(b) => Value::String(bytes_to_hex(b)),
        AbiValue::String(s) => Value::String(s.clone()),
        AbiValue::Array(items) | AbiValue::Tuple(items) => {
            Value::Array(items.iter().map(value_to_json).collect())
        }
    }
}

/// Renders a payload as a JSON object keyed by field name.
#[must_use]
pub fn payload_to_json(payload: &Payload) -> Value {
    let mut map = Map::new();
    for (name, value) in payload.iter() {
        map.insert(name.to_string(), value_to_json(value));
    }
    Value::Object(map)
}

/// Renders a payload as a positional JSON array.
#[must_use]
pub fn payload_to_json_array(payload: &Payload) -> Value {
    Value::Array(payload.iter().map(|(_, v)| value_to_json(v)).collect())
}
