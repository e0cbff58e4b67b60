//! # Routes
//!
//! Route identity and call outcomes.

use crate::domain::config::RouteConfig;
use crate::errors::ErrorKind;
use rd_01_abi_codec::prelude::{PayloadDescriptor, Selector};
use serde::Serialize;
use shared_types::Address;
use std::fmt;

/// Mutation (advance) or query (inspect).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteKind {
    /// State-changing route, reached by advance inputs.
    Mutation,
    /// Read-only route, reached by inspect inputs.
    Query,
}

/// `module.method`, unique within an engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteKey {
    /// Module name (after overrides).
    pub module: String,
    /// Method name.
    pub method: String,
}

impl RouteKey {
    /// Creates a key.
    pub fn new(module: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            method: method.into(),
        }
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.module, self.method)
    }
}

/// How a route is found on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteIdentity {
    /// 4-byte header of `keccak256("module.method(types)")`.
    Selector(Selector),
    /// Header-less: selected by the caller address alone.
    Caller(Address),
    /// Query reached by URL template or structured method name.
    Query {
        /// `module/method/{p}`
        url: String,
        /// `module_method`
        method: String,
    },
}

impl fmt::Display for RouteIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Selector(sel) => write!(f, "0x{}", hex::encode(sel)),
            Self::Caller(addr) => write!(f, "caller:{addr}"),
            Self::Query { url, method } => write!(f, "{url} | {method}"),
        }
    }
}

/// Introspection record for one registration.
#[derive(Debug, Clone)]
pub struct RouteInfo {
    /// Route key.
    pub key: RouteKey,
    /// Route kind.
    pub kind: RouteKind,
    /// Wire identity.
    pub identity: RouteIdentity,
    /// Payload layout, if the handler takes a payload.
    pub descriptor: Option<PayloadDescriptor>,
    /// Registration flags.
    pub config: RouteConfig,
}

/// What a handler reports back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallStatus {
    /// Commit writes.
    Accept,
    /// Discard writes.
    Reject,
}

impl From<bool> for CallStatus {
    fn from(ok: bool) -> Self {
        if ok {
            Self::Accept
        } else {
            Self::Reject
        }
    }
}

/// Result of dispatching one input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome {
    /// Handler accepted; writes committed.
    Accepted,
    /// Handler rejected, or no route matched; writes discarded.
    Rejected,
    /// Recoverable error; writes discarded and an error report emitted.
    Failed {
        /// Error class.
        kind: ErrorKind,
        /// Error message.
        message: String,
    },
    /// Committed state could not be made durable. The engine refuses every
    /// later input and the host should stop.
    Halted {
        /// Cause of the halt.
        message: String,
    },
}

impl CallOutcome {
    /// Status reported to the rollup.
    #[must_use]
    pub fn status(&self) -> CallStatus {
        match self {
            Self::Accepted => CallStatus::Accept,
            Self::Rejected | Self::Failed { .. } | Self::Halted { .. } => CallStatus::Reject,
        }
    }

    /// Returns true when accepted.
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }

    /// Returns true when the engine stopped accepting inputs.
    #[must_use]
    pub fn is_halted(&self) -> bool {
        matches!(self, Self::Halted { .. })
    }

    /// Error class of a failed call.
    #[must_use]
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Failed { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}
