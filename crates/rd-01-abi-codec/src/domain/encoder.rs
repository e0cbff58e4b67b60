//! # ABI Encoder
//!
//! Standard head/tail tuple encoding and the unpadded packed encoding.

use super::types::{AbiType, WORD};
use super::value::AbiValue;
use crate::errors::AbiError;
use primitive_types::U256;
use shared_types::u256_to_word;

// =============================================================================
// STANDARD ENCODING
// =============================================================================

/// Encodes owned values as one ABI tuple.
pub fn encode(types: &[AbiType], values: &[AbiValue]) -> Result<Vec<u8>, AbiError> {
    let refs: Vec<&AbiValue> = values.iter().collect();
    encode_tuple(types, &refs)
}

/// Encodes `values` as an ABI tuple of `types`.
///
/// Static members live in the head; dynamic members get an offset word in
/// the head (relative to the tuple start) and their data in the tail.
pub fn encode_tuple(types: &[AbiType], values: &[&AbiValue]) -> Result<Vec<u8>, AbiError> {
    if types.len() != values.len() {
        return Err(AbiError::TypeMismatch {
            field: "tuple".to_string(),
            expected: format!("{} values", types.len()),
        });
    }

    let head_len: usize = types.iter().map(AbiType::head_size).sum();
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for (ty, value) in types.iter().zip(values) {
        let encoded = encode_value(ty, value)?;
        if ty.is_dynamic() {
            head.extend_from_slice(&usize_word(head_len + tail.len()));
            tail.extend(encoded);
        } else {
            head.extend(encoded);
        }
    }

    head.extend(tail);
    Ok(head)
}

fn encode_value(ty: &AbiType, value: &AbiValue) -> Result<Vec<u8>, AbiError> {
    let mismatch = || AbiError::TypeMismatch {
        field: "value".to_string(),
        expected: ty.canonical(),
    };
    if !value.matches(ty) {
        return Err(mismatch());
    }

    match (ty, value) {
        (AbiType::Uint(_), AbiValue::Uint(v)) | (AbiType::Int(_), AbiValue::Int(v)) => {
            Ok(u256_to_word(*v).to_vec())
        }
        (AbiType::Address, AbiValue::Address(a)) => {
            let mut word = vec![0u8; WORD];
            word[WORD - 20..].copy_from_slice(a.as_bytes());
            Ok(word)
        }
        (AbiType::Bool, AbiValue::Bool(b)) => Ok(usize_word(usize::from(*b)).to_vec()),
        (AbiType::FixedBytes(_), AbiValue::FixedBytes(bytes)) => Ok(pad_right(bytes)),
        (AbiType::Bytes, AbiValue::Bytes(bytes)) => Ok(encode_dynamic_bytes(bytes)),
        (AbiType::String, AbiValue::String(s)) => Ok(encode_dynamic_bytes(s.as_bytes())),
        (AbiType::Array(inner), AbiValue::Array(items)) => {
            let types = vec![(**inner).clone(); items.len()];
            let refs: Vec<&AbiValue> = items.iter().collect();
            let mut out = usize_word(items.len()).to_vec();
            out.extend(encode_tuple(&types, &refs)?);
            Ok(out)
        }
        (AbiType::FixedArray(inner, len), AbiValue::Array(items)) => {
            let types = vec![(**inner).clone(); *len];
            let refs: Vec<&AbiValue> = items.iter().collect();
            encode_tuple(&types, &refs)
        }
        (AbiType::Tuple(types), AbiValue::Tuple(items)) => {
            let refs: Vec<&AbiValue> = items.iter().collect();
            encode_tuple(types, &refs)
        }
        _ => Err(mismatch()),
    }
}

fn encode_dynamic_bytes(bytes: &[u8]) -> Vec<u8> {
    let mut out = usize_word(bytes.len()).to_vec();
    out.extend(pad_right(bytes));
    out
}

fn pad_right(bytes: &[u8]) -> Vec<u8> {
    let padded = bytes.len().div_ceil(WORD) * WORD;
    let mut out = bytes.to_vec();
    out.resize(padded, 0);
    out
}

fn usize_word(value: usize) -> [u8; 32] {
    u256_to_word(U256::from(value))
}

// =============================================================================
// PACKED ENCODING
// =============================================================================

/// Packed encoding: scalars at their natural width, `bytes`/`string` raw,
/// list elements padded to full words. Tuples cannot be packed.
pub fn encode_packed(types: &[AbiType], values: &[&AbiValue]) -> Result<Vec<u8>, AbiError> {
    let mut out = Vec::new();
    for (ty, value) in types.iter().zip(values) {
        if !value.matches(ty) {
            return Err(AbiError::TypeMismatch {
                field: "value".to_string(),
                expected: ty.canonical(),
            });
        }
        match (ty, value) {
            (AbiType::Uint(bits), AbiValue::Uint(v)) | (AbiType::Int(bits), AbiValue::Int(v)) => {
                let word = u256_to_word(*v);
                out.extend_from_slice(&word[WORD - bits / 8..]);
            }
            (AbiType::Address, AbiValue::Address(a)) => out.extend_from_slice(a.as_bytes()),
            (AbiType::Bool, AbiValue::Bool(b)) => out.push(u8::from(*b)),
            (AbiType::FixedBytes(_), AbiValue::FixedBytes(bytes))
            | (AbiType::Bytes, AbiValue::Bytes(bytes)) => out.extend_from_slice(bytes),
            (AbiType::String, AbiValue::String(s)) => out.extend_from_slice(s.as_bytes()),
            (AbiType::Array(inner) | AbiType::FixedArray(inner, _), AbiValue::Array(items)) => {
                if inner.is_dynamic() || matches!(**inner, AbiType::Tuple(_)) {
                    return Err(AbiError::UnsupportedPacked(ty.canonical()));
                }
                for item in items {
                    out.extend(encode_value(inner, item)?);
                }
            }
            _ => return Err(AbiError::UnsupportedPacked(ty.canonical())),
        }
    }
    Ok(out)
}
