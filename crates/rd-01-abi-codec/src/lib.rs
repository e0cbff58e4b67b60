//! # RD-01 ABI Codec - Payload Encoding Subsystem
//!
//! **Subsystem ID:** 01
//!
//! ## Purpose
//!
//! Describes structured payloads as ordered `(name, type)` tables and
//! converts them to and from the Solidity ABI wire format. Every mutation
//! input, notice and voucher that crosses the rollup boundary goes through
//! this crate.
//!
//! ## Encodings
//!
//! | Encoding | Layout | Used by |
//! |----------|--------|---------|
//! | Standard | 32-byte head words, dynamic tails | Mutation inputs, notices, vouchers |
//! | Packed | Natural widths, no padding | `packed` routes, relay input |
//!
//! ## Decoding Rules
//!
//! - Words must be canonical for their type (`uint8` above 255 is rejected).
//! - Offsets and lengths must stay inside the input.
//! - Strings must be valid UTF-8.
//! - Trailing bytes after the last value are ignored.
//!
//! ## Usage Example
//!
//! ```ignore
//! use rd_01_abi_codec::prelude::*;
//!
//! let desc = PayloadDescriptor::new("Transfer")
//!     .with_field("to", AbiType::Address)
//!     .with_field("amount", AbiType::UINT256);
//! let header = selector(&desc.signature("wallet.transfer"));
//! let body = desc.encode(&payload)?;
//! ```

// Crate-level lints
#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

// =============================================================================
// MODULES
// =============================================================================

pub mod domain;
pub mod errors;

// =============================================================================
// PRELUDE
// =============================================================================

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::domain::decoder::{decode_packed, decode_tuple};
    pub use crate::domain::encoder::{encode, encode_packed, encode_tuple};
    pub use crate::domain::{
        keccak256, selector, signature, AbiPayload, AbiType, AbiValue, FieldDescriptor, Payload,
        PayloadDescriptor, Selector, SELECTOR_LEN, WORD,
    };
    pub use crate::errors::AbiError;
}

// =============================================================================
// CRATE INFO
// =============================================================================

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Subsystem ID.
pub const SUBSYSTEM_ID: u8 = 1;

/// Subsystem name.
pub const SUBSYSTEM_NAME: &str = "ABI Codec";
