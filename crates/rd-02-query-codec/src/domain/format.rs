//! # Query Formats

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Wire format a module accepts for inspect queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryFormat {
    /// `module/method/{path}?field=value`
    Url,
    /// `{"method": "module_method", "params": ...}`
    #[default]
    Json,
    /// Structured request with `jsonrpc` and `id`.
    JsonRpc,
}

impl QueryFormat {
    /// Guesses the format of a raw inspect payload.
    ///
    /// A JSON object with a `method` member is structured (JSON-RPC when it
    /// also carries `jsonrpc`); anything else is treated as a URL.
    #[must_use]
    pub fn detect(raw: &[u8]) -> Self {
        let Ok(serde_json::Value::Object(obj)) = serde_json::from_slice::<serde_json::Value>(raw)
        else {
            return Self::Url;
        };
        if !obj.contains_key("method") {
            return Self::Url;
        }
        if obj.contains_key("jsonrpc") {
            Self::JsonRpc
        } else {
            Self::Json
        }
    }

    /// Returns true for the two JSON-object formats.
    #[must_use]
    pub fn is_structured(self) -> bool {
        matches!(self, Self::Json | Self::JsonRpc)
    }

    /// Lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Url => "url",
            Self::Json => "json",
            Self::JsonRpc => "jsonrpc",
        }
    }
}

impl fmt::Display for QueryFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "url" => Ok(Self::Url),
            "json" => Ok(Self::Json),
            "jsonrpc" | "json-rpc" => Ok(Self::JsonRpc),
            other => Err(format!("unknown query format: {other}")),
        }
    }
}
