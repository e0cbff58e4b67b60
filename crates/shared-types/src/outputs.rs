//! # Outputs
//!
//! Output kinds, encodings and the wire size ceilings that are part of the
//! rollup protocol contract.

use crate::value_objects::{Address, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// SIZE CEILINGS
// =============================================================================

/// Ceiling of a single report/notice/voucher payload actually sent: (2097152-17)/2.
pub const MAX_OUTPUT_SIZE: usize = 1_048_567;

/// Ceiling of a logical report payload before framing: 4 MiB minus 56 bytes
/// of hex prefix and JSON framing.
pub const MAX_AGGREGATED_OUTPUT_SIZE: usize = 4_194_248;

/// Usable bytes per part of a splittable query result. The missing byte
/// carries the continuation marker.
pub const MAX_SPLITTABLE_OUTPUT_SIZE: usize = 4_194_247;

/// Byte appended to a split part when more parts follow.
pub const CONTINUATION_MARKER: u8 = b'0';

// =============================================================================
// OUTPUT KIND
// =============================================================================

/// Kind of a rollup output (or indexed input).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    /// Off-chain diagnostic/result output.
    Report,
    /// Verifiable output with an inclusion proof.
    Notice,
    /// Deferred base-layer contract call.
    Voucher,
    /// An indexed input (index records only).
    Input,
}

impl OutputKind {
    /// Lowercase name used in index records and filters.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Report => "report",
            Self::Notice => "notice",
            Self::Voucher => "voucher",
            Self::Input => "input",
        }
    }
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "report" => Ok(Self::Report),
            "notice" => Ok(Self::Notice),
            "voucher" => Ok(Self::Voucher),
            "input" => Ok(Self::Input),
            other => Err(format!("unknown output kind: {other}")),
        }
    }
}

// =============================================================================
// OUTPUT FORMAT
// =============================================================================

/// Encoding applied to structured payloads before they are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Standard ABI tuple encoding.
    #[default]
    Abi,
    /// Packed ABI encoding (no padding).
    PackedAbi,
    /// JSON text.
    Json,
}

// =============================================================================
// VOUCHER
// =============================================================================

/// A voucher as handed to the rollup channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voucher {
    /// Contract the call targets.
    pub destination: Address,
    /// Transfer value carried out-of-band (never hashed into the selector).
    pub value: U256,
    /// `<4-byte selector><tuple-encoded args>`.
    #[serde(with = "hex_payload")]
    pub payload: Vec<u8>,
}

mod hex_payload {
    use crate::value_objects::{bytes_to_hex, hex_to_bytes};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&bytes_to_hex(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex_to_bytes(&s).map_err(de::Error::custom)
    }
}
