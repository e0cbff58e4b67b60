//! # Adapters

pub mod file;
pub mod memory;

pub use file::FileBackedIndexStore;
pub use memory::InMemoryIndexStore;
