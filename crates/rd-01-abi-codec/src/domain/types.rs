//! # ABI Types
//!
//! The type tags a payload field can carry, with their canonical spelling
//! (used in signatures) and their layout properties.

use crate::errors::AbiError;
use std::fmt;
use std::str::FromStr;

/// Size of one ABI word.
pub const WORD: usize = 32;

/// A Solidity ABI type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AbiType {
    /// `uintN`, N in bits (8..=256, multiple of 8).
    Uint(usize),
    /// `intN`, N in bits (8..=256, multiple of 8).
    Int(usize),
    /// `address`.
    Address,
    /// `bool`.
    Bool,
    /// `bytesN`, N in 1..=32.
    FixedBytes(usize),
    /// `bytes`.
    Bytes,
    /// `string`.
    String,
    /// `T[]`.
    Array(Box<AbiType>),
    /// `T[k]`.
    FixedArray(Box<AbiType>, usize),
    /// `(T1,T2,...)`.
    Tuple(Vec<AbiType>),
}

impl AbiType {
    /// `uint256`, the most common numeric type.
    pub const UINT256: Self = Self::Uint(256);

    /// `T[]` of the given element type.
    #[must_use]
    pub fn array_of(inner: AbiType) -> Self {
        Self::Array(Box::new(inner))
    }

    /// Returns true if the encoding of this type has a variable size.
    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        match self {
            Self::Bytes | Self::String | Self::Array(_) => true,
            Self::FixedArray(inner, _) => inner.is_dynamic(),
            Self::Tuple(items) => items.iter().any(AbiType::is_dynamic),
            _ => false,
        }
    }

    /// Returns true for list-shaped types (`T[]`, `T[k]`).
    #[must_use]
    pub fn is_list(&self) -> bool {
        matches!(self, Self::Array(_) | Self::FixedArray(..))
    }

    /// Bytes this type occupies in the head of an enclosing tuple.
    #[must_use]
    pub fn head_size(&self) -> usize {
        if self.is_dynamic() {
            return WORD;
        }
        match self {
            Self::FixedArray(inner, len) => inner.head_size() * len,
            Self::Tuple(items) => items.iter().map(AbiType::head_size).sum(),
            _ => WORD,
        }
    }

    /// Width in packed encoding, or None for variable-width types.
    #[must_use]
    pub fn packed_width(&self) -> Option<usize> {
        match self {
            Self::Uint(bits) | Self::Int(bits) => Some(bits / 8),
            Self::Address => Some(20),
            Self::Bool => Some(1),
            Self::FixedBytes(len) => Some(*len),
            _ => None,
        }
    }

    /// Canonical spelling used in function signatures.
    #[must_use]
    pub fn canonical(&self) -> String {
        match self {
            Self::Uint(bits) => format!("uint{bits}"),
            Self::Int(bits) => format!("int{bits}"),
            Self::Address => "address".to_string(),
            Self::Bool => "bool".to_string(),
            Self::FixedBytes(len) => format!("bytes{len}"),
            Self::Bytes => "bytes".to_string(),
            Self::String => "string".to_string(),
            Self::Array(inner) => format!("{}[]", inner.canonical()),
            Self::FixedArray(inner, len) => format!("{}[{len}]", inner.canonical()),
            Self::Tuple(items) => format!(
                "({})",
                items
                    .iter()
                    .map(AbiType::canonical)
                    .collect::<Vec<_>>()
                    .join(",")
            ),
        }
    }

    /// Parses a type string such as `uint256`, `bytes32[]` or `(address,uint8)[2]`.
    pub fn parse(s: &str) -> Result<Self, AbiError> {
        let s = s.trim();
        let invalid = || AbiError::InvalidType(s.to_string());

        if let Some(body) = s.strip_suffix(']') {
            let open = body.rfind('[').ok_or_else(invalid)?;
            let inner = Self::parse(&body[..open])?;
            let dim = &body[open + 1..];
            if dim.is_empty() {
                return Ok(Self::Array(Box::new(inner)));
            }
            let len: usize = dim.parse().map_err(|_| invalid())?;
            if len == 0 {
                return Err(invalid());
            }
            return Ok(Self::FixedArray(Box::new(inner), len));
        }

        if let Some(body) = s.strip_prefix('(').and_then(|b| b.strip_suffix(')')) {
            if body.trim().is_empty() {
                return Ok(Self::Tuple(Vec::new()));
            }
            return split_top_level(body)
                .into_iter()
                .map(Self::parse)
                .collect::<Result<Vec<_>, _>>()
                .map(Self::Tuple);
        }

        match s {
            "address" => return Ok(Self::Address),
            "bool" => return Ok(Self::Bool),
            "bytes" => return Ok(Self::Bytes),
            "string" => return Ok(Self::String),
            "uint" => return Ok(Self::Uint(256)),
            "int" => return Ok(Self::Int(256)),
            _ => {}
        }

        if let Some(bits) = s.strip_prefix("uint") {
            return parse_bits(bits).map(Self::Uint).ok_or_else(invalid);
        }
        if let Some(bits) = s.strip_prefix("int") {
            return parse_bits(bits).map(Self::Int).ok_or_else(invalid);
        }
        if let Some(len) = s.strip_prefix("bytes") {
            return match len.parse::<usize>() {
                Ok(n) if (1..=32).contains(&n) => Ok(Self::FixedBytes(n)),
                _ => Err(invalid()),
            };
        }

        Err(invalid())
    }
}

impl fmt::Display for AbiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

impl FromStr for AbiType {
    type Err = AbiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn parse_bits(s: &str) -> Option<usize> {
    let bits: usize = s.parse().ok()?;
    (bits % 8 == 0 && (8..=256).contains(&bits)).then_some(bits)
}

/// Splits on commas that are not nested inside parentheses.
fn split_top_level(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}
