//! # Payload Descriptors
//!
//! A [`PayloadDescriptor`] is the ordered `(name, type, required)` table of a
//! structured payload. It is built once per payload type at wiring time and
//! used unchanged to decode inputs and encode outputs.

use super::types::AbiType;
use super::value::AbiValue;
use super::{decoder, encoder, selector};
use crate::errors::AbiError;
use primitive_types::U256;
use shared_types::Address;
use std::collections::HashSet;

// =============================================================================
// FIELD DESCRIPTOR
// =============================================================================

/// One named, typed field of a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Field name.
    pub name: String,
    /// Declared ABI type.
    pub ty: AbiType,
    /// Required fields must be present when decoding from text formats.
    pub required: bool,
}

impl FieldDescriptor {
    /// A required field.
    pub fn required(name: impl Into<String>, ty: AbiType) -> Self {
        Self {
            name: name.into(),
            ty,
            required: true,
        }
    }

    /// An optional field.
    pub fn optional(name: impl Into<String>, ty: AbiType) -> Self {
        Self {
            name: name.into(),
            ty,
            required: false,
        }
    }
}

// =============================================================================
// PAYLOAD DESCRIPTOR
// =============================================================================

/// Ordered description of a structured payload (an ABI tuple).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadDescriptor {
    name: String,
    fields: Vec<FieldDescriptor>,
}

impl PayloadDescriptor {
    /// Creates an empty descriptor with the given type name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Descriptor of handlers that take no payload.
    #[must_use]
    pub fn empty() -> Self {
        Self::new("Empty")
    }

    /// Appends a required field.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, ty: AbiType) -> Self {
        self.fields.push(FieldDescriptor::required(name, ty));
        self
    }

    /// Appends an optional field.
    #[must_use]
    pub fn with_optional(mut self, name: impl Into<String>, ty: AbiType) -> Self {
        self.fields.push(FieldDescriptor::optional(name, ty));
        self
    }

    /// Type name (used for class names and default voucher selectors).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Looks up a field by name.
    #[must_use]
    pub fn get_field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns true if no fields are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field types in order.
    #[must_use]
    pub fn abi_types(&self) -> Vec<AbiType> {
        self.fields.iter().map(|f| f.ty.clone()).collect()
    }

    /// The descriptor viewed as one tuple type.
    #[must_use]
    pub fn tuple_type(&self) -> AbiType {
        AbiType::Tuple(self.abi_types())
    }

    /// `function(type1,type2,...)`.
    #[must_use]
    pub fn signature(&self, function: &str) -> String {
        selector::signature(function, &self.abi_types())
    }

    /// A new descriptor named `name` holding these fields followed by `extra`.
    #[must_use]
    pub fn extended(&self, name: impl Into<String>, extra: Vec<FieldDescriptor>) -> Self {
        let mut fields = self.fields.clone();
        fields.extend(extra);
        Self {
            name: name.into(),
            fields,
        }
    }

    /// Rejects duplicate field names.
    pub fn validate(&self) -> Result<(), AbiError> {
        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(AbiError::DuplicateField(field.name.clone()));
            }
        }
        Ok(())
    }

    /// Returns true if packed decoding is unambiguous for this layout:
    /// fixed-width scalars, plus at most one `bytes`/`string` as the last field.
    #[must_use]
    pub fn is_packable(&self) -> bool {
        let last = self.fields.len().saturating_sub(1);
        self.fields.iter().enumerate().all(|(i, f)| {
            f.ty.packed_width().is_some()
                || (i == last && matches!(f.ty, AbiType::Bytes | AbiType::String))
        })
    }

    /// Values in declaration order, failing on a missing or mistyped field.
    pub fn ordered_values<'a>(&self, payload: &'a Payload) -> Result<Vec<&'a AbiValue>, AbiError> {
        self.fields
            .iter()
            .map(|field| {
                let value = payload
                    .get(&field.name)
                    .ok_or_else(|| AbiError::MissingField(field.name.clone()))?;
                if value.matches(&field.ty) {
                    Ok(value)
                } else {
                    Err(AbiError::TypeMismatch {
                        field: field.name.clone(),
                        expected: field.ty.canonical(),
                    })
                }
            })
            .collect()
    }

    /// Standard ABI tuple encoding of `payload`.
    pub fn encode(&self, payload: &Payload) -> Result<Vec<u8>, AbiError> {
        let values = self.ordered_values(payload)?;
        encoder::encode_tuple(&self.abi_types(), &values)
    }

    /// Packed (unpadded) encoding of `payload`.
    pub fn encode_packed(&self, payload: &Payload) -> Result<Vec<u8>, AbiError> {
        let values = self.ordered_values(payload)?;
        encoder::encode_packed(&self.abi_types(), &values)
    }

    /// Decodes a standard ABI tuple into a payload.
    pub fn decode(&self, data: &[u8]) -> Result<Payload, AbiError> {
        let values = decoder::decode_tuple(&self.abi_types(), data)?;
        Ok(self.zip(values))
    }

    /// Decodes a packed encoding into a payload.
    pub fn decode_packed(&self, data: &[u8]) -> Result<Payload, AbiError> {
        let values = decoder::decode_packed(&self.abi_types(), data)?;
        Ok(self.zip(values))
    }

    fn zip(&self, values: Vec<AbiValue>) -> Payload {
        Payload {
            fields: self
                .fields
                .iter()
                .map(|f| f.name.clone())
                .zip(values)
                .collect(),
        }
    }
}

// =============================================================================
// PAYLOAD
// =============================================================================

/// A decoded structured payload: named values in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Payload {
    fields: Vec<(String, AbiValue)>,
}

impl Payload {
    /// An empty payload.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<AbiValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Sets a field, replacing an existing value of the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<AbiValue>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Field value by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AbiValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Returns true if the field is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Number of present fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if no field is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AbiValue)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Keeps only the fields declared by `descriptor`, in its order.
    #[must_use]
    pub fn project(&self, descriptor: &PayloadDescriptor) -> Payload {
        Payload {
            fields: descriptor
                .fields()
                .iter()
                .filter_map(|f| self.get(&f.name).map(|v| (f.name.clone(), v.clone())))
                .collect(),
        }
    }

    fn require(&self, name: &str) -> Result<&AbiValue, AbiError> {
        self.get(name)
            .ok_or_else(|| AbiError::MissingField(name.to_string()))
    }

    fn mismatch(name: &str, expected: &str) -> AbiError {
        AbiError::TypeMismatch {
            field: name.to_string(),
            expected: expected.to_string(),
        }
    }

    /// Unsigned integer field.
    pub fn get_uint(&self, name: &str) -> Result<U256, AbiError> {
        self.require(name)?
            .as_uint()
            .ok_or_else(|| Self::mismatch(name, "uint"))
    }

    /// Unsigned integer field that must fit in `u64`.
    pub fn get_u64(&self, name: &str) -> Result<u64, AbiError> {
        let value = self.get_uint(name)?;
        if value.bits() > 64 {
            return Err(Self::mismatch(name, "uint64"));
        }
        Ok(value.as_u64())
    }

    /// Optional unsigned integer field that must fit in `u64`.
    pub fn get_opt_u64(&self, name: &str) -> Result<Option<u64>, AbiError> {
        if self.contains(name) {
            self.get_u64(name).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Signed integer field that must fit in `i128`.
    pub fn get_int(&self, name: &str) -> Result<i128, AbiError> {
        self.require(name)?
            .as_i128()
            .ok_or_else(|| Self::mismatch(name, "int"))
    }

    /// Address field.
    pub fn get_address(&self, name: &str) -> Result<Address, AbiError> {
        self.require(name)?
            .as_address()
            .ok_or_else(|| Self::mismatch(name, "address"))
    }

    /// Boolean field.
    pub fn get_bool(&self, name: &str) -> Result<bool, AbiError> {
        self.require(name)?
            .as_bool()
            .ok_or_else(|| Self::mismatch(name, "bool"))
    }

    /// String field.
    pub fn get_string(&self, name: &str) -> Result<String, AbiError> {
        self.require(name)?
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| Self::mismatch(name, "string"))
    }

    /// Optional string field.
    pub fn get_opt_string(&self, name: &str) -> Result<Option<String>, AbiError> {
        if self.contains(name) {
            self.get_string(name).map(Some)
        } else {
            Ok(None)
        }
    }

    /// `bytes`/`bytesN` field.
    pub fn get_bytes(&self, name: &str) -> Result<Vec<u8>, AbiError> {
        self.require(name)?
            .as_bytes()
            .map(<[u8]>::to_vec)
            .ok_or_else(|| Self::mismatch(name, "bytes"))
    }

    /// List field of strings.
    pub fn get_string_list(&self, name: &str) -> Result<Vec<String>, AbiError> {
        let items = self
            .require(name)?
            .as_list()
            .ok_or_else(|| Self::mismatch(name, "string[]"))?;
        items
            .iter()
            .map(|v| {
                v.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| Self::mismatch(name, "string[]"))
            })
            .collect()
    }
}

// =============================================================================
// TYPED PAYLOADS
// =============================================================================

/// A Rust type with a fixed payload layout.
///
/// Implementations return the same descriptor on every call; registration
/// reads it once and keeps it for the lifetime of the engine.
pub trait AbiPayload: Sized {
    /// Layout of this type.
    fn descriptor() -> PayloadDescriptor;

    /// Converts `self` into a dynamic payload.
    fn to_payload(&self) -> Payload;

    /// Builds `Self` from a decoded payload.
    fn from_payload(payload: &Payload) -> Result<Self, AbiError>;

    /// Standard ABI encoding of `self`.
    fn abi_encode(&self) -> Result<Vec<u8>, AbiError> {
        Self::descriptor().encode(&self.to_payload())
    }

    /// Decodes `Self` from a standard ABI tuple.
    fn abi_decode(data: &[u8]) -> Result<Self, AbiError> {
        Self::from_payload(&Self::descriptor().decode(data)?)
    }
}
