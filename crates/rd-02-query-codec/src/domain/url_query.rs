//! # URL Queries
//!
//! `module/method[/{path}...]?field=value&field=value`
//!
//! Path segments after `module/method` bind positionally to the route's
//! declared path parameters; query-string keys bind by name and may repeat
//! for list fields. Segments are taken literally: `.` and `..` are values,
//! not navigation.

use super::json::value_to_json;
use super::params::{ParamBag, RawValue};
use crate::errors::QueryError;
use percent_encoding::{percent_decode_str, utf8_percent_encode, NON_ALPHANUMERIC};
use rd_01_abi_codec::prelude::{AbiValue, Payload};
use serde_json::Value;
use url::form_urlencoded;

/// A parsed URL query before it is matched to a route.
#[derive(Debug, Clone, PartialEq)]
pub struct UrlQuery {
    /// Decoded path segments (`module`, `method`, then path values).
    pub segments: Vec<String>,
    /// Query-string parameters.
    pub params: ParamBag,
}

impl UrlQuery {
    /// Parses a raw inspect payload.
    pub fn parse(raw: &[u8]) -> Result<Self, QueryError> {
        let text = std::str::from_utf8(raw).map_err(|e| QueryError::Parse(e.to_string()))?;
        let text = text.trim().trim_start_matches('/');
        if text.is_empty() {
            return Err(QueryError::InvalidRequest("empty query path".into()));
        }
        let text = text.split_once('#').map_or(text, |(before, _)| before);
        let (path, query) = text.split_once('?').unwrap_or((text, ""));

        let segments = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| percent_decode_str(s).decode_utf8_lossy().into_owned())
            .collect::<Vec<_>>();
        if segments.len() < 2 {
            return Err(QueryError::MethodNotFound(text.to_string()));
        }

        let mut params = ParamBag::new();
        for (k, v) in form_urlencoded::parse(query.as_bytes()) {
            params.push(k.into_owned(), RawValue::Text(v.into_owned()));
        }

        Ok(Self { segments, params })
    }

    /// The `module` segment.
    #[must_use]
    pub fn module(&self) -> &str {
        &self.segments[0]
    }

    /// The `method` segment.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.segments[1]
    }

    /// Path values after `module/method`.
    #[must_use]
    pub fn path_values(&self) -> &[String] {
        &self.segments[2..]
    }

    /// Binds the path values to `path_params` and returns the merged bag.
    ///
    /// Path values take precedence over query-string values of the same name.
    pub fn into_params(self, path_params: &[String]) -> Result<ParamBag, QueryError> {
        let values = self.path_values();
        if values.len() != path_params.len() {
            return Err(QueryError::MethodNotFound(self.segments.join("/")));
        }
        let mut bag = ParamBag::new();
        for (name, value) in path_params.iter().zip(values) {
            bag.push(name.clone(), RawValue::Text(value.clone()));
        }
        for name in self.params.names() {
            if path_params.iter().any(|p| p == name) {
                continue;
            }
            for raw in self.params.get(name).unwrap_or_default() {
                bag.push(name, raw.clone());
            }
        }
        Ok(bag)
    }
}

/// Route template `module/method/{p1}/{p2}`.
#[must_use]
pub fn url_template(module: &str, method: &str, path_params: &[String]) -> String {
    let mut path = format!("{module}/{method}");
    for p in path_params {
        path.push_str(&format!("/{{{p}}}"));
    }
    path
}

/// Encodes a URL query for a route. Fields named in `path_params` go into
/// the path; the rest into the query string (lists as repeated keys).
pub fn encode_url_query(
    module: &str,
    method: &str,
    path_params: &[String],
    payload: &Payload,
) -> Result<String, QueryError> {
    let mut path = format!("{module}/{method}");
    for p in path_params {
        let value = payload
            .get(p)
            .ok_or_else(|| QueryError::MissingParam(p.clone()))?;
        path.push('/');
        path.push_str(&utf8_percent_encode(&text_of(value), NON_ALPHANUMERIC).to_string());
    }

    let mut query = form_urlencoded::Serializer::new(String::new());
    for (name, value) in payload.iter() {
        if path_params.iter().any(|p| p == name) {
            continue;
        }
        match value {
            AbiValue::Array(items) => {
                for item in items {
                    query.append_pair(name, &text_of(item));
                }
            }
            other => {
                query.append_pair(name, &text_of(other));
            }
        }
    }
    let query = query.finish();

    if query.is_empty() {
        Ok(path)
    } else {
        Ok(format!("{path}?{query}"))
    }
}

fn text_of(value: &AbiValue) -> String {
    match value_to_json(value) {
        Value::String(s) => s,
        other => other.to_string(),
    }
}
