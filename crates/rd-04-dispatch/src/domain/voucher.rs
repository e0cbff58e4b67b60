//! # Voucher Payloads
//!
//! A voucher is a deferred contract call:
//! `first4(keccak256("name(type1,type2,...)")) ++ abi_encode(args)`.
//! The transfer value travels next to the payload and is never hashed.

use rd_01_abi_codec::prelude::{selector, AbiError, Payload, PayloadDescriptor, Selector};

/// Selector of the call `function(types of descriptor)`.
#[must_use]
pub fn voucher_selector(function: &str, descriptor: &PayloadDescriptor) -> Selector {
    selector(&descriptor.signature(function))
}

/// Builds the call data of a voucher. `function` defaults to the
/// descriptor's own name when `None`.
pub fn build_voucher_payload(
    function: Option<&str>,
    descriptor: &PayloadDescriptor,
    payload: &Payload,
) -> Result<Vec<u8>, AbiError> {
    let function = function.unwrap_or_else(|| descriptor.name());
    let mut data = voucher_selector(function, descriptor).to_vec();
    data.extend(descriptor.encode(payload)?);
    Ok(data)
}
