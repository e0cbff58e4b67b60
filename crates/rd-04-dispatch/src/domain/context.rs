//! # Call Context
//!
//! Per-call state threaded through one handler invocation.
//!
//! ## State Machine
//!
//! ```text
//! Idle ──activate()──→ Active(call) ──drop(ContextGuard)──→ Idle
//! ```
//!
//! The engine owns a single context that is reused across the sequential
//! call loop. [`ContextGuard`] is the only way to activate it, and clearing
//! happens in `Drop`, so every counter and payload reference is reset even
//! when the handler returns an error or panics.

use crate::domain::config::ModuleSettings;
use crate::domain::route::RouteKey;
use crate::errors::DispatchError;
use rd_01_abi_codec::prelude::Payload;
use serde_json::Value;
use shared_types::{Address, BlockMetadata};
use std::ops::{Deref, DerefMut};

/// Mutable state of the current call. Default is Idle.
#[derive(Debug, Default)]
pub struct CallContext {
    active: bool,
    /// Route being executed.
    pub route: Option<RouteKey>,
    /// Settings of the executing module.
    pub settings: ModuleSettings,
    /// Block metadata; present exactly when the call is an advance.
    pub metadata: Option<BlockMetadata>,
    /// Effective caller (after proxy override).
    pub sender: Option<Address>,
    /// Reports emitted so far.
    pub n_reports: u64,
    /// Notices emitted so far.
    pub n_notices: u64,
    /// Vouchers emitted so far.
    pub n_vouchers: u64,
    /// Outputs recorded in the index during this call.
    pub n_indexed: u64,
    /// Decoded input payload.
    pub input_payload: Option<Payload>,
    /// Class name recorded for the input in the index.
    pub input_class: String,
    /// Extra query parameters (`part`) bound from the extended descriptor.
    pub extended_params: Option<Payload>,
    /// Result may be requested in parts.
    pub splittable: bool,
    /// JSON-RPC request id of the current query.
    pub rpc_id: Option<Value>,
    /// `index_input` was already called.
    pub input_indexed: bool,
    /// Application contract set by the handler, adopted on commit.
    pub pending_app_contract: Option<Address>,
}

impl CallContext {
    /// Returns true between activation and clearing.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Returns true for advance calls.
    #[must_use]
    pub fn is_advance(&self) -> bool {
        self.metadata.is_some()
    }

    /// Module name of the executing route.
    #[must_use]
    pub fn module(&self) -> &str {
        self.route.as_ref().map_or("", |r| r.module.as_str())
    }

    /// Resets every field to Idle.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Scope of one active call. Clears the context on drop.
#[derive(Debug)]
pub struct ContextGuard<'a> {
    ctx: &'a mut CallContext,
}

impl<'a> ContextGuard<'a> {
    /// Activates `ctx` for `route`. Advance calls carry `metadata`; inspect
    /// calls pass `None`.
    pub fn activate(
        ctx: &'a mut CallContext,
        route: RouteKey,
        settings: ModuleSettings,
        metadata: Option<BlockMetadata>,
    ) -> Result<Self, DispatchError> {
        if ctx.active {
            return Err(DispatchError::ContextMisuse(
                "a call is already in progress".into(),
            ));
        }
        ctx.active = true;
        ctx.sender = metadata.as_ref().map(|m| m.msg_sender);
        ctx.metadata = metadata;
        ctx.route = Some(route);
        ctx.settings = settings;
        Ok(Self { ctx })
    }
}

impl Deref for ContextGuard<'_> {
    type Target = CallContext;

    fn deref(&self) -> &CallContext {
        self.ctx
    }
}

impl DerefMut for ContextGuard<'_> {
    fn deref_mut(&mut self) -> &mut CallContext {
        self.ctx
    }
}

impl Drop for ContextGuard<'_> {
    fn drop(&mut self) {
        self.ctx.clear();
    }
}
