//! # Error Types
//!
//! Two families:
//!
//! - [`ConfigurationError`]: programming errors in route wiring or engine
//!   configuration. Raised once, at startup, and never recovered.
//! - [`DispatchError`]: everything that can go wrong while handling one
//!   input. The dispatcher recovers locally by matching on [`ErrorKind`].

use rd_01_abi_codec::errors::AbiError;
use rd_02_query_codec::errors::QueryError;
use rd_03_output_index::errors::IndexError;
use shared_types::{Address, StorageError};
use std::fmt;
use thiserror::Error;

// =============================================================================
// CONFIGURATION ERRORS
// =============================================================================

/// Fatal wiring or configuration error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// Two registrations resolve to the same `module.method`.
    #[error("duplicate route: {0}")]
    DuplicateRoute(String),

    /// Two mutations share a 4-byte selector.
    #[error("selector 0x{selector} of {second} collides with {first}")]
    DuplicateSelector {
        selector: String,
        first: String,
        second: String,
    },

    /// Two queries share a structured method name.
    #[error("duplicate query method name: {0}")]
    DuplicateMethod(String),

    /// Two header-less mutations are discriminated by the same caller.
    #[error("caller {0} already selects another header-less route")]
    DuplicateSender(Address),

    /// A header-less mutation has no caller to select it by.
    #[error("header-less route {0} requires msg_sender")]
    HeaderlessWithoutSender(String),

    /// `proxy` and `msg_sender` are mutually exclusive.
    #[error("route {0} sets both proxy and msg_sender")]
    ConflictingCallerConfig(String),

    /// A path parameter is not a field of the payload.
    #[error("route {route}: path parameter {param} is not a payload field")]
    UnknownPathParam { route: String, param: String },

    /// Packed decoding requested for a layout that cannot be packed.
    #[error("route {0}: payload layout cannot use packed encoding")]
    NotPackable(String),

    /// Splittable output requested on a mutation.
    #[error("route {0}: splittable output is only available to queries")]
    SplittableMutation(String),

    /// The payload descriptor itself is malformed.
    #[error("route {route}: {source}")]
    InvalidDescriptor { route: String, source: AbiError },

    /// Modules request different storage locations.
    #[error("conflicting storage paths: {0}")]
    ConflictingStoragePaths(String),

    /// A module appears twice in the settings list.
    #[error("duplicate module settings: {0}")]
    DuplicateModule(String),

    /// Settings name a module that has no routes.
    #[error("settings for unknown module: {0}")]
    UnknownModuleSettings(String),

    /// Configuration could not be read or parsed.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

// =============================================================================
// DISPATCH ERRORS
// =============================================================================

/// Recoverable error classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed wire payload.
    Decode,
    /// Oversized output, or a second report in an inspect call.
    SizeLimit,
    /// Handler failed (returned an error, panicked, or a collaborator failed).
    Handler,
    /// Handler used an operation the current call does not allow.
    ContextMisuse,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Decode => "decode",
            Self::SizeLimit => "size_limit",
            Self::Handler => "handler",
            Self::ContextMisuse => "context_misuse",
        })
    }
}

/// Error raised while handling one input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// Wire payload could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// Output exceeds its ceiling.
    #[error("size limit: {0}")]
    SizeLimit(String),

    /// Handler failure.
    #[error("handler error: {0}")]
    Handler(String),

    /// Operation not allowed in the current call.
    #[error("context misuse: {0}")]
    ContextMisuse(String),

    /// Key-value store failure.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Index store failure.
    #[error(transparent)]
    Index(#[from] IndexError),

    /// Rollup channel failure.
    #[error("rollup channel error: {0}")]
    Rollup(String),

    /// Committed state could not be flushed to durable media.
    #[error("durability failure: {0}")]
    Durability(StorageError),
}

impl DispatchError {
    /// Classifies the error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Decode(_) => ErrorKind::Decode,
            Self::SizeLimit(_) => ErrorKind::SizeLimit,
            Self::ContextMisuse(_) => ErrorKind::ContextMisuse,
            Self::Handler(_)
            | Self::Storage(_)
            | Self::Index(_)
            | Self::Rollup(_)
            | Self::Durability(_) => ErrorKind::Handler,
        }
    }

    /// Returns true when the engine cannot safely handle further inputs.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Durability(_))
    }

    /// Shorthand for a handler failure.
    pub fn handler(msg: impl Into<String>) -> Self {
        Self::Handler(msg.into())
    }
}

impl From<AbiError> for DispatchError {
    fn from(e: AbiError) -> Self {
        Self::Decode(e.to_string())
    }
}

impl From<QueryError> for DispatchError {
    fn from(e: QueryError) -> Self {
        Self::Decode(e.to_string())
    }
}

/// Error returned by a rollup channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct RollupError(pub String);

impl From<RollupError> for DispatchError {
    fn from(e: RollupError) -> Self {
        Self::Rollup(e.0)
    }
}
