//! # RD-03 Output Index - Secondary Tag Index
//!
//! **Subsystem ID:** 03
//!
//! ## Purpose
//!
//! Records one entry per indexed input and per emitted output so off-chain
//! readers can find outputs by tag, module, sender, time range or input
//! index without replaying the rollup.
//!
//! ## Invariants
//!
//! | Invariant | Enforcement |
//! |-----------|-------------|
//! | Entries are append-only | `IndexStore` exposes no update besides back-fill |
//! | `app_contract` is back-filled once | `backfill_app_contract` skips entries that have it |
//! | Writes follow the call transaction | `IndexStore: Transactional` |

// Crate-level lints
#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

// =============================================================================
// MODULES
// =============================================================================

pub mod adapters;
pub mod domain;
pub mod errors;
pub mod ports;

// =============================================================================
// PRELUDE
// =============================================================================

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::adapters::{FileBackedIndexStore, InMemoryIndexStore};
    pub use crate::domain::{IndexEntry, IndexFilter, IndexPage, OrderField, DEFAULT_PAGE_SIZE};
    pub use crate::errors::IndexError;
    pub use crate::ports::IndexStore;
}

// =============================================================================
// CRATE INFO
// =============================================================================

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Subsystem ID.
pub const SUBSYSTEM_ID: u8 = 3;

/// Subsystem name.
pub const SUBSYSTEM_NAME: &str = "Output Index";
