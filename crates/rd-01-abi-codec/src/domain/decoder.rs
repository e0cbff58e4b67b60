//! # ABI Decoder
//!
//! Strict decoding: every word must be the canonical encoding of its type
//! and every offset or length must stay inside the input. Dynamic tails
//! start after the head block and never overlap, so each input byte is
//! decoded at most once. Bytes after the last value are ignored.

use super::types::{AbiType, WORD};
use super::value::{int_fits, AbiValue};
use crate::errors::AbiError;
use primitive_types::U256;
use shared_types::Address;

/// Largest offset or length word accepted before bounds checks.
const MAX_LENGTH_BITS: usize = 32;

// =============================================================================
// STANDARD DECODING
// =============================================================================

/// Decodes an ABI tuple of `types` from `data`.
pub fn decode_tuple(types: &[AbiType], data: &[u8]) -> Result<Vec<AbiValue>, AbiError> {
    decode_tuple_extent(types, data).map(|(values, _)| values)
}

/// Decodes a tuple and returns how many bytes of `data` it spans.
fn decode_tuple_extent(types: &[AbiType], data: &[u8]) -> Result<(Vec<AbiValue>, usize), AbiError> {
    let mut values = Vec::with_capacity(types.len());
    let mut head = 0usize;
    let mut end: usize = types.iter().map(AbiType::head_size).sum();

    for ty in types {
        let value = if ty.is_dynamic() {
            let offset = read_length(data, head)?;
            if offset < end {
                return Err(AbiError::InvalidOffset(format!(
                    "{offset} overlaps data ending at {end}"
                )));
            }
            let tail = data.get(offset..).ok_or(AbiError::DataTooShort {
                needed: offset,
                available: data.len(),
            })?;
            let (value, used) = decode_value(ty, tail)?;
            end = offset + used;
            value
        } else {
            decode_value(ty, &data[head.min(data.len())..])?.0
        };
        values.push(value);
        head += ty.head_size();
    }

    Ok((values, end))
}

/// Decodes one value and returns it with the number of bytes it spans.
fn decode_value(ty: &AbiType, data: &[u8]) -> Result<(AbiValue, usize), AbiError> {
    let value = match ty {
        AbiType::Uint(bits) => {
            let value = U256::from_big_endian(read_word(data, 0)?);
            if value.bits() > *bits {
                return Err(AbiError::NonCanonical(ty.canonical()));
            }
            AbiValue::Uint(value)
        }
        AbiType::Int(bits) => {
            let value = U256::from_big_endian(read_word(data, 0)?);
            if !int_fits(value, *bits) {
                return Err(AbiError::NonCanonical(ty.canonical()));
            }
            AbiValue::Int(value)
        }
        AbiType::Address => {
            let word = read_word(data, 0)?;
            if word[..WORD - 20].iter().any(|b| *b != 0) {
                return Err(AbiError::NonCanonical(ty.canonical()));
            }
            Address::from_slice(&word[WORD - 20..])
                .map(AbiValue::Address)
                .ok_or_else(|| AbiError::NonCanonical(ty.canonical()))?
        }
        AbiType::Bool => {
            let word = read_word(data, 0)?;
            if word[..WORD - 1].iter().any(|b| *b != 0) || word[WORD - 1] > 1 {
                return Err(AbiError::NonCanonical(ty.canonical()));
            }
            AbiValue::Bool(word[WORD - 1] == 1)
        }
        AbiType::FixedBytes(len) => {
            let word = read_word(data, 0)?;
            if word[*len..].iter().any(|b| *b != 0) {
                return Err(AbiError::NonCanonical(ty.canonical()));
            }
            AbiValue::FixedBytes(word[..*len].to_vec())
        }
        AbiType::Bytes => {
            let bytes = read_dynamic_bytes(data)?;
            return Ok((AbiValue::Bytes(bytes.to_vec()), WORD + bytes.len()));
        }
        AbiType::String => {
            let bytes = read_dynamic_bytes(data)?;
            let text = String::from_utf8(bytes.to_vec()).map_err(|_| AbiError::InvalidUtf8)?;
            return Ok((AbiValue::String(text), WORD + bytes.len()));
        }
        AbiType::Array(inner) => {
            let len = read_length(data, 0)?;
            let body = &data[WORD..];
            // Each element needs at least its head slot.
            let needed = len.saturating_mul(inner.head_size());
            if needed > body.len() {
                return Err(AbiError::DataTooShort {
                    needed: needed + WORD,
                    available: data.len(),
                });
            }
            let (items, used) = decode_tuple_extent(&vec![(**inner).clone(); len], body)?;
            return Ok((AbiValue::Array(items), WORD + used));
        }
        AbiType::FixedArray(inner, len) => {
            let (items, used) = decode_tuple_extent(&vec![(**inner).clone(); *len], data)?;
            return Ok((AbiValue::Array(items), used));
        }
        AbiType::Tuple(types) => {
            let (items, used) = decode_tuple_extent(types, data)?;
            return Ok((AbiValue::Tuple(items), used));
        }
    };
    Ok((value, WORD))
}

fn read_word(data: &[u8], pos: usize) -> Result<&[u8], AbiError> {
    data.get(pos..pos + WORD).ok_or(AbiError::DataTooShort {
        needed: pos + WORD,
        available: data.len(),
    })
}

fn read_length(data: &[u8], pos: usize) -> Result<usize, AbiError> {
    let value = U256::from_big_endian(read_word(data, pos)?);
    if value.bits() > MAX_LENGTH_BITS {
        return Err(AbiError::InvalidOffset(value.to_string()));
    }
    usize::try_from(value.as_u64()).map_err(|_| AbiError::InvalidOffset(value.to_string()))
}

fn read_dynamic_bytes(data: &[u8]) -> Result<&[u8], AbiError> {
    let len = read_length(data, 0)?;
    data.get(WORD..WORD + len).ok_or(AbiError::DataTooShort {
        needed: WORD + len,
        available: data.len(),
    })
}

// =============================================================================
// PACKED DECODING
// =============================================================================

/// Decodes a packed encoding of fixed-width scalars optionally followed by
/// one trailing `bytes`/`string` that takes the rest of the input.
pub fn decode_packed(types: &[AbiType], data: &[u8]) -> Result<Vec<AbiValue>, AbiError> {
    let mut values = Vec::with_capacity(types.len());
    let mut pos = 0usize;
    let last = types.len().saturating_sub(1);

    for (i, ty) in types.iter().enumerate() {
        if let Some(width) = ty.packed_width() {
            let chunk = data.get(pos..pos + width).ok_or(AbiError::DataTooShort {
                needed: pos + width,
                available: data.len(),
            })?;
            values.push(decode_packed_scalar(ty, chunk)?);
            pos += width;
            continue;
        }

        let rest = &data[pos.min(data.len())..];
        match ty {
            AbiType::Bytes if i == last => values.push(AbiValue::Bytes(rest.to_vec())),
            AbiType::String if i == last => {
                let s = String::from_utf8(rest.to_vec()).map_err(|_| AbiError::InvalidUtf8)?;
                values.push(AbiValue::String(s));
            }
            _ => return Err(AbiError::UnsupportedPacked(ty.canonical())),
        }
        pos = data.len();
    }

    Ok(values)
}

fn decode_packed_scalar(ty: &AbiType, chunk: &[u8]) -> Result<AbiValue, AbiError> {
    match ty {
        AbiType::Uint(_) => Ok(AbiValue::Uint(U256::from_big_endian(chunk))),
        AbiType::Int(_) => {
            let negative = chunk.first().is_some_and(|b| b & 0x80 != 0);
            let mut word = [if negative { 0xff } else { 0 }; WORD];
            word[WORD - chunk.len()..].copy_from_slice(chunk);
            Ok(AbiValue::Int(U256::from_big_endian(&word)))
        }
        AbiType::Address => Address::from_slice(chunk)
            .map(AbiValue::Address)
            .ok_or_else(|| AbiError::NonCanonical(ty.canonical())),
        AbiType::Bool => match chunk {
            [0] => Ok(AbiValue::Bool(false)),
            [1] => Ok(AbiValue::Bool(true)),
            _ => Err(AbiError::NonCanonical(ty.canonical())),
        },
        AbiType::FixedBytes(_) => Ok(AbiValue::FixedBytes(chunk.to_vec())),
        _ => Err(AbiError::UnsupportedPacked(ty.canonical())),
    }
}
