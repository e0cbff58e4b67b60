//! # Selectors
//!
//! Function signatures and their 4-byte keccak selectors.

use super::types::AbiType;
use sha3::{Digest, Keccak256};

/// Length of a selector header.
pub const SELECTOR_LEN: usize = 4;

/// A 4-byte selector.
pub type Selector = [u8; SELECTOR_LEN];

/// Computes keccak256 of arbitrary data.
#[must_use]
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

/// Builds `name(t1,t2,...)` from canonical type names.
#[must_use]
pub fn signature(name: &str, types: &[AbiType]) -> String {
    let args: Vec<String> = types.iter().map(AbiType::canonical).collect();
    format!("{name}({})", args.join(","))
}

/// First four bytes of keccak256 of the signature text.
#[must_use]
pub fn selector(signature: &str) -> Selector {
    let hash = keccak256(signature.as_bytes());
    let mut out = [0u8; SELECTOR_LEN];
    out.copy_from_slice(&hash[..SELECTOR_LEN]);
    out
}
