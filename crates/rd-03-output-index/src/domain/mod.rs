//! # Domain Layer

pub mod entry;
pub mod filter;

pub use entry::IndexEntry;
pub use filter::{IndexFilter, IndexPage, OrderField, DEFAULT_PAGE_SIZE};
