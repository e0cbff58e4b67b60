//! # Shared Types Crate
//!
//! Value objects, rollup metadata, output kinds and the transactional storage
//! contract shared by the codec, index and dispatch crates.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: wire ceilings and output kinds are defined once.
//! - **No I/O**: this crate only defines types and contracts.

pub mod errors;
pub mod metadata;
pub mod outputs;
pub mod storage;
pub mod value_objects;

pub use errors::*;
pub use metadata::BlockMetadata;
pub use outputs::*;
pub use storage::Transactional;
pub use value_objects::*;
