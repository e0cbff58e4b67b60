//! # Domain Layer
//!
//! Query wire formats and parameter binding.

pub mod envelope;
pub mod format;
pub mod json;
pub mod params;
pub mod request;
pub mod url_query;

pub use envelope::{RpcErrorObject, RpcResponse};
pub use format::QueryFormat;
pub use json::{payload_to_json, payload_to_json_array, value_to_json};
pub use params::{coerce, parse_int, parse_uint, ParamBag, RawValue};
pub use request::{
    encode_json_query, encode_jsonrpc_query, method_name, RequestParams, StructuredRequest,
};
pub use url_query::{encode_url_query, url_template, UrlQuery};
