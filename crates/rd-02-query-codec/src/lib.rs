//! # RD-02 Query Codec - Read-Only Query Formats
//!
//! **Subsystem ID:** 02
//!
//! ## Purpose
//!
//! Parses inspect payloads into parameter bags and binds them to payload
//! descriptors. Each module accepts exactly one format.
//!
//! ## Formats
//!
//! | Format | Shape | Route identity |
//! |--------|-------|----------------|
//! | `url` | `module/method/{p}?k=v&k=v` | path template |
//! | `json` | `{"method":"module_method","params":...}` | method name |
//! | `jsonrpc` | as `json` plus `jsonrpc` and `id` | method name |
//!
//! ## Binding Rules
//!
//! - Fields are walked in declaration order; unknown names are ignored.
//! - List fields collect repeated keys or JSON array elements.
//! - Scalar fields take the first occurrence.
//! - Missing required fields are an error (`-32602` for JSON-RPC).

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
    pub use crate::domain::{
        encode_json_query, encode_jsonrpc_query, encode_url_query, method_name, payload_to_json,
        url_template, value_to_json, ParamBag, QueryFormat, RawValue, RequestParams, RpcResponse,
        StructuredRequest, UrlQuery,
    };
    pub use crate::errors::{codes, QueryError};
}

// =============================================================================
// CRATE INFO
// =============================================================================

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Subsystem ID.
pub const SUBSYSTEM_ID: u8 = 2;

/// Subsystem name.
pub const SUBSYSTEM_NAME: &str = "Query Codec";
