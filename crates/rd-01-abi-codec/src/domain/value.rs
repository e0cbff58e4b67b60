//! # ABI Values
//!
//! Dynamically typed values carried by payload fields.

use super::types::AbiType;
use primitive_types::U256;
use shared_types::Address;

/// A value of some [`AbiType`].
///
/// Signed integers are stored as 256-bit two's complement words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiValue {
    /// Unsigned integer.
    Uint(U256),
    /// Signed integer (two's complement).
    Int(U256),
    /// 20-byte address.
    Address(Address),
    /// Boolean.
    Bool(bool),
    /// Fixed-length byte string.
    FixedBytes(Vec<u8>),
    /// Variable-length byte string.
    Bytes(Vec<u8>),
    /// UTF-8 string.
    String(String),
    /// Homogeneous list (`T[]` or `T[k]`).
    Array(Vec<AbiValue>),
    /// Heterogeneous tuple.
    Tuple(Vec<AbiValue>),
}

impl AbiValue {
    /// Signed integer from an `i128`.
    #[must_use]
    pub fn int(value: i128) -> Self {
        Self::Int(i128_to_twos(value))
    }

    /// Unsigned integer from a `u64`.
    #[must_use]
    pub fn uint(value: u64) -> Self {
        Self::Uint(U256::from(value))
    }

    /// Returns the unsigned integer, if this is one.
    #[must_use]
    pub fn as_uint(&self) -> Option<U256> {
        match self {
            Self::Uint(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the signed integer as `i128`, if it is one and fits.
    #[must_use]
    pub fn as_i128(&self) -> Option<i128> {
        match self {
            Self::Int(v) => twos_to_i128(*v),
            _ => None,
        }
    }

    /// Returns the address, if this is one.
    #[must_use]
    pub fn as_address(&self) -> Option<Address> {
        match self {
            Self::Address(a) => Some(*a),
            _ => None,
        }
    }

    /// Returns the boolean, if this is one.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the string, if this is one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the raw bytes of `bytes`/`bytesN` values.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) | Self::FixedBytes(b) => Some(b),
            _ => None,
        }
    }

    /// Returns the elements of lists and tuples.
    #[must_use]
    pub fn as_list(&self) -> Option<&[AbiValue]> {
        match self {
            Self::Array(items) | Self::Tuple(items) => Some(items),
            _ => None,
        }
    }

    /// Returns true if the value can be encoded as `ty`.
    #[must_use]
    pub fn matches(&self, ty: &AbiType) -> bool {
        match (self, ty) {
            (Self::Uint(v), AbiType::Uint(bits)) => v.bits() <= *bits,
            (Self::Int(v), AbiType::Int(bits)) => int_fits(*v, *bits),
            (Self::Address(_), AbiType::Address) | (Self::Bool(_), AbiType::Bool) => true,
            (Self::FixedBytes(b), AbiType::FixedBytes(len)) => b.len() == *len,
            (Self::Bytes(_), AbiType::Bytes) | (Self::String(_), AbiType::String) => true,
            (Self::Array(items), AbiType::Array(inner)) => items.iter().all(|v| v.matches(inner)),
            (Self::Array(items), AbiType::FixedArray(inner, len)) => {
                items.len() == *len && items.iter().all(|v| v.matches(inner))
            }
            (Self::Tuple(items), AbiType::Tuple(types)) => {
                items.len() == types.len() && items.iter().zip(types).all(|(v, t)| v.matches(t))
            }
            _ => false,
        }
    }
}

impl From<U256> for AbiValue {
    fn from(v: U256) -> Self {
        Self::Uint(v)
    }
}

impl From<u64> for AbiValue {
    fn from(v: u64) -> Self {
        Self::uint(v)
    }
}

impl From<bool> for AbiValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<Address> for AbiValue {
    fn from(v: Address) -> Self {
        Self::Address(v)
    }
}

impl From<String> for AbiValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for AbiValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<Vec<u8>> for AbiValue {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

// =============================================================================
// TWO'S COMPLEMENT HELPERS
// =============================================================================

/// Converts an `i128` to a 256-bit two's complement word.
#[must_use]
pub fn i128_to_twos(value: i128) -> U256 {
    if value >= 0 {
        U256::from(value.unsigned_abs())
    } else {
        let magnitude = U256::from(value.unsigned_abs());
        (!magnitude).overflowing_add(U256::one()).0
    }
}

/// Signed decimal text of a two's complement word.
#[must_use]
pub fn twos_to_decimal(word: U256) -> String {
    if word.bit(255) {
        let magnitude = (!word).overflowing_add(U256::one()).0;
        format!("-{magnitude}")
    } else {
        word.to_string()
    }
}

/// Converts a two's complement word back to `i128` when it fits.
#[must_use]
pub fn twos_to_i128(word: U256) -> Option<i128> {
    if word.bit(255) {
        let magnitude = (!word).overflowing_add(U256::one()).0;
        if magnitude.bits() > 127 {
            // i128::MIN has magnitude 2^127
            return (magnitude == U256::one() << 127).then_some(i128::MIN);
        }
        Some(-(magnitude.as_u128() as i128))
    } else if word.bits() <= 127 {
        Some(word.as_u128() as i128)
    } else {
        None
    }
}

/// Returns true if the two's complement word is a valid sign-extended `intN`.
#[must_use]
pub fn int_fits(word: U256, bits: usize) -> bool {
    if bits >= 256 {
        return true;
    }
    if word.bit(255) {
        // All bits from bits-1 upwards must be set.
        let magnitude = (!word).overflowing_add(U256::one()).0;
        magnitude <= U256::one() << (bits - 1)
    } else {
        word.bits() < bits
    }
}
