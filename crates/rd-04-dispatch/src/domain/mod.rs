//! # Domain Layer
//!
//! Configuration, route identity, per-call state, output shaping and
//! voucher call data. Nothing here touches storage or the rollup.

pub mod config;
pub mod context;
pub mod output;
pub mod route;
pub mod stats;
pub mod voucher;

pub use config::{EngineConfig, ModuleSettings, RouteConfig, DEFAULT_RELAY_ADDRESS};
pub use context::{CallContext, ContextGuard};
pub use output::{frames, split_part, truncate_aggregated, OutputData};
pub use route::{CallOutcome, CallStatus, RouteIdentity, RouteInfo, RouteKey, RouteKind};
pub use stats::EngineStats;
pub use voucher::{build_voucher_payload, voucher_selector};
