//! # Outbound Ports (Driven Ports)
//!
//! The index store is a transactional collaborator: entries appended and
//! back-fills applied inside a call become visible to later calls only
//! after `commit`, and vanish on `rollback`.

use crate::domain::{IndexEntry, IndexFilter, IndexPage};
use crate::errors::IndexError;
use shared_types::{Address, Transactional};

/// Append-only store of index entries.
pub trait IndexStore: Transactional {
    /// Appends an entry, assigning its `id`. Returns the assigned id.
    fn append(&mut self, entry: IndexEntry) -> Result<u64, IndexError>;

    /// Sets `app_contract` on every entry that does not have one yet.
    /// Returns the number of entries updated.
    fn backfill_app_contract(&mut self, app_contract: Address) -> Result<usize, IndexError>;

    /// Application contract of the last committed back-fill.
    fn app_contract(&self) -> Option<Address>;

    /// Runs a filtered, sorted, paginated query over visible entries.
    fn query(&self, filter: &IndexFilter) -> Result<IndexPage, IndexError>;

    /// Number of visible entries.
    fn len(&self) -> usize;

    /// Returns true if no entry is visible.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
