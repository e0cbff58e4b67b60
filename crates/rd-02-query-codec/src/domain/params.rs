//! # Parameter Binding
//!
//! Collects raw query parameters (URL text or JSON values) and binds them
//! to a [`PayloadDescriptor`] by coercing each one against the declared
//! field type. List fields collect every occurrence; scalar fields take the
//! first.

use crate::errors::QueryError;
use primitive_types::U256;
use rd_01_abi_codec::prelude::{AbiType, AbiValue, Payload, PayloadDescriptor};
use serde_json::Value;
use shared_types::{hex_to_bytes, Address};

/// One raw occurrence of a parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// Text from a URL path segment or query string.
    Text(String),
    /// Value from a structured request.
    Json(Value),
}

/// Named parameters with every occurrence kept in arrival order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamBag {
    entries: Vec<(String, Vec<RawValue>)>,
}

impl ParamBag {
    /// An empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one occurrence of `name`.
    pub fn push(&mut self, name: impl Into<String>, value: RawValue) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, values)) => values.push(value),
            None => self.entries.push((name, vec![value])),
        }
    }

    /// Builds a bag from a JSON object (one occurrence per member).
    #[must_use]
    pub fn from_json_object(obj: &serde_json::Map<String, Value>) -> Self {
        let mut bag = Self::new();
        for (k, v) in obj {
            bag.push(k.clone(), RawValue::Json(v.clone()));
        }
        bag
    }

    /// Binds positional JSON values to the descriptor's fields in order.
    pub fn from_positional(
        descriptor: &PayloadDescriptor,
        values: &[Value],
    ) -> Result<Self, QueryError> {
        if values.len() > descriptor.fields().len() {
            return Err(QueryError::InvalidRequest(format!(
                "expected at most {} params, got {}",
                descriptor.fields().len(),
                values.len()
            )));
        }
        let mut bag = Self::new();
        for (field, value) in descriptor.fields().iter().zip(values) {
            if !value.is_null() {
                bag.push(field.name.clone(), RawValue::Json(value.clone()));
            }
        }
        Ok(bag)
    }

    /// All occurrences of `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&[RawValue]> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    /// Parameter names in arrival order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Returns true if no parameter is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Binds the bag to `descriptor`. Unknown names are ignored; missing
    /// required fields are an error; missing optional fields stay absent.
    pub fn bind(&self, descriptor: &PayloadDescriptor) -> Result<Payload, QueryError> {
        let mut payload = Payload::new();
        for field in descriptor.fields() {
            match self.get(&field.name) {
                Some(raw) => {
                    let value = coerce_occurrences(&field.name, &field.ty, raw)?;
                    payload.insert(field.name.clone(), value);
                }
                None if field.required => {
                    return Err(QueryError::MissingParam(field.name.clone()));
                }
                None => {}
            }
        }
        Ok(payload)
    }
}

// =============================================================================
// COERCION
// =============================================================================

fn coerce_occurrences(name: &str, ty: &AbiType, raw: &[RawValue]) -> Result<AbiValue, QueryError> {
    match ty {
        AbiType::Array(inner) | AbiType::FixedArray(inner, _) => {
            let items: Vec<RawValue> = match raw {
                [RawValue::Json(Value::Array(items))] => {
                    items.iter().cloned().map(RawValue::Json).collect()
                }
                other => other.to_vec(),
            };
            let values = items
                .iter()
                .map(|item| coerce(name, inner, item))
                .collect::<Result<Vec<_>, _>>()?;
            if let AbiType::FixedArray(_, len) = ty {
                if values.len() != *len {
                    return Err(QueryError::invalid_value(
                        name,
                        format!("expected {len} items, got {}", values.len()),
                    ));
                }
            }
            Ok(AbiValue::Array(values))
        }
        _ => {
            let first = raw
                .first()
                .ok_or_else(|| QueryError::MissingParam(name.to_string()))?;
            coerce(name, ty, first)
        }
    }
}

/// Coerces one raw value to `ty`.
pub fn coerce(name: &str, ty: &AbiType, raw: &RawValue) -> Result<AbiValue, QueryError> {
    let bad = |reason: &str| QueryError::invalid_value(name, format!("{reason} for {ty}"));

    let value = match (ty, raw) {
        (AbiType::Uint(_), RawValue::Text(s)) => AbiValue::Uint(parse_uint(s).ok_or_else(|| bad("invalid integer"))?),
        (AbiType::Uint(_), RawValue::Json(Value::Number(n))) => {
            AbiValue::Uint(U256::from(n.as_u64().ok_or_else(|| bad("invalid integer"))?))
        }
        (AbiType::Int(_), RawValue::Text(s)) => AbiValue::Int(parse_int(s).ok_or_else(|| bad("invalid integer"))?),
        (AbiType::Int(_), RawValue::Json(Value::Number(n))) => {
            let v = n
                .as_i64()
                .map(i128::from)
                .or_else(|| n.as_u64().map(i128::from))
                .ok_or_else(|| bad("invalid integer"))?;
            AbiValue::int(v)
        }
        (AbiType::Bool, RawValue::Text(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => AbiValue::Bool(true),
            "false" | "0" => AbiValue::Bool(false),
            _ => return Err(bad("invalid boolean")),
        },
        (AbiType::Bool, RawValue::Json(Value::Bool(b))) => AbiValue::Bool(*b),
        (AbiType::Address, RawValue::Text(s) | RawValue::Json(Value::String(s))) => {
            AbiValue::Address(s.trim().parse::<Address>().map_err(|_| bad("invalid address"))?)
        }
        (AbiType::FixedBytes(_), RawValue::Text(s) | RawValue::Json(Value::String(s))) => {
            AbiValue::FixedBytes(hex_to_bytes(s.trim()).map_err(|_| bad("invalid hex"))?)
        }
        (AbiType::Bytes, RawValue::Text(s) | RawValue::Json(Value::String(s))) => {
            AbiValue::Bytes(hex_to_bytes(s.trim()).map_err(|_| bad("invalid hex"))?)
        }
        (AbiType::String, RawValue::Text(s) | RawValue::Json(Value::String(s))) => {
            AbiValue::String(s.clone())
        }
        (AbiType::String, RawValue::Json(v @ (Value::Number(_) | Value::Bool(_)))) => {
            AbiValue::String(v.to_string())
        }
        // Numeric strings inside JSON ("1000", "0x10", "-4").
        (AbiType::Uint(_) | AbiType::Int(_) | AbiType::Bool, RawValue::Json(Value::String(s))) => {
            return coerce(name, ty, &RawValue::Text(s.clone()));
        }
        (AbiType::Array(_) | AbiType::FixedArray(..), RawValue::Json(Value::Array(_))) => {
            return coerce_occurrences(name, ty, std::slice::from_ref(raw));
        }
        (AbiType::Array(_) | AbiType::FixedArray(..) | AbiType::Tuple(_), RawValue::Text(s)) => {
            let json: Value = serde_json::from_str(s).map_err(|_| bad("invalid json"))?;
            return coerce(name, ty, &RawValue::Json(json));
        }
        (AbiType::Tuple(types), RawValue::Json(Value::Array(items))) => {
            if items.len() != types.len() {
                return Err(bad("wrong tuple arity"));
            }
            AbiValue::Tuple(
                types
                    .iter()
                    .zip(items)
                    .map(|(t, v)| coerce(name, t, &RawValue::Json(v.clone())))
                    .collect::<Result<Vec<_>, _>>()?,
            )
        }
        _ => return Err(bad("unexpected value")),
    };

    if value.matches(ty) {
        Ok(value)
    } else {
        Err(bad("value out of range"))
    }
}

/// Parses a decimal or `0x` hex unsigned integer.
#[must_use]
pub fn parse_uint(s: &str) -> Option<U256> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        U256::from_str_radix(hex, 16).ok()
    } else {
        U256::from_dec_str(s).ok()
    }
}

/// Parses a decimal or `0x` hex signed integer, with an optional sign, into
/// a two's complement word. Magnitudes outside the `int256` range fail.
#[must_use]
pub fn parse_int(s: &str) -> Option<U256> {
    let s = s.trim();
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let magnitude = parse_uint(digits)?;
    let min_magnitude = U256::one() << 255;
    if negative {
        (magnitude <= min_magnitude).then(|| (!magnitude).overflowing_add(U256::one()).0)
    } else {
        (magnitude < min_magnitude).then_some(magnitude)
    }
}
