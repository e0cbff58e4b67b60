//! # Domain Layer
//!
//! Pure ABI logic: types, values, payload descriptors, encodings, selectors.

pub mod decoder;
pub mod descriptor;
pub mod encoder;
pub mod selector;
pub mod types;
pub mod value;

pub use descriptor::{AbiPayload, FieldDescriptor, Payload, PayloadDescriptor};
pub use selector::{keccak256, selector, signature, Selector, SELECTOR_LEN};
pub use types::{AbiType, WORD};
pub use value::AbiValue;
