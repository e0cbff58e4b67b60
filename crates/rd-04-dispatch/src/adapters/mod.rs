//! # Adapters
//!
//! Implementations of the outbound ports.
//!
//! | Adapter | Port | Use |
//! |---------|------|-----|
//! | `InMemoryKVStore` | `KeyValueStore` | tests, volatile runs |
//! | `FileBackedKVStore` | `KeyValueStore` | host mode with a storage path |
//! | `RecordingRollup` | `RollupChannel` | tests |

mod overlay;

pub mod file_kv;
pub mod memory_kv;
pub mod recording;

pub use file_kv::FileBackedKVStore;
pub use memory_kv::InMemoryKVStore;
pub use recording::RecordingRollup;
