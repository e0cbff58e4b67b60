//! # RD-04 Dispatch - Route Registry, Call Context and Output Channel
//!
//! **Subsystem ID:** 04
//!
//! ## Purpose
//!
//! Turns raw rollup inputs into typed handler invocations, and handler
//! results back into framed, size-bounded reports, notices and vouchers.
//!
//! ## Wire Identity
//!
//! | Input | Routed by |
//! |-------|-----------|
//! | Advance with header | `keccak256("module.method(types)")[0..4]` |
//! | Advance without header | caller address |
//! | Inspect, URL | `module/method[/path params][?query]` |
//! | Inspect, JSON / JSON-RPC | `"method": "module_method"` |
//!
//! ## Invariants
//!
//! | Invariant | Enforcement |
//! |-----------|-------------|
//! | Context is Idle outside a call | `ContextGuard` clears on drop |
//! | Inspect never persists | `DispatchEngine::inspect` always rolls back |
//! | Reject and errors leave no state | rollback before returning |
//! | Frames never exceed `MAX_OUTPUT_SIZE` | `output::frames` |
//! | Wiring errors surface before any input | `DispatchEngineBuilder::build` |
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = DispatchEngine::builder(EngineConfig::default())
//!     .register_typed_mutation::<Deposit, _>("bank", "deposit", RouteConfig::new(), |call, d| {
//!         call.notice(format!("deposited {}", d.amount))?;
//!         Ok(CallStatus::Accept)
//!     })?
//!     .build(InMemoryKVStore::new(), InMemoryIndexStore::new(), RecordingRollup::new())?;
//! engine.advance(metadata, &input);
//! ```

// Crate-level lints
#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

// =============================================================================
// MODULES
// =============================================================================

pub mod adapters;
pub mod builtins;
pub mod call;
pub mod domain;
pub mod errors;
pub mod ports;
pub mod registry;
pub mod service;

// =============================================================================
// PRELUDE
// =============================================================================

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::adapters::{FileBackedKVStore, InMemoryKVStore, RecordingRollup};
    pub use crate::builtins::{INDEXER_METHOD, INDEXER_MODULE, RELAY_METHOD, RELAY_MODULE};
    pub use crate::call::Call;
    pub use crate::domain::{
        CallOutcome, CallStatus, EngineConfig, EngineStats, ModuleSettings, OutputData,
        RouteConfig, RouteIdentity, RouteInfo, RouteKey, RouteKind, DEFAULT_RELAY_ADDRESS,
    };
    pub use crate::errors::{ConfigurationError, DispatchError, ErrorKind, RollupError};
    pub use crate::ports::{KeyValueStore, RollupApp, RollupChannel};
    pub use crate::service::{DispatchEngine, DispatchEngineBuilder};
}

// =============================================================================
// CRATE INFO
// =============================================================================

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Subsystem ID.
pub const SUBSYSTEM_ID: u8 = 4;

/// Subsystem name.
pub const SUBSYSTEM_NAME: &str = "Dispatch";
