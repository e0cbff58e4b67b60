//! # In-Memory Index Store
//!
//! Committed entries plus a pending overlay for the open transaction.

use crate::domain::{IndexEntry, IndexFilter, IndexPage};
use crate::errors::IndexError;
use crate::ports::IndexStore;
use shared_types::{Address, StorageError, Transactional};
use tracing::debug;

/// Volatile index store.
#[derive(Debug, Default)]
pub struct InMemoryIndexStore {
    committed: Vec<IndexEntry>,
    pending: Vec<IndexEntry>,
    pending_app_contract: Option<Address>,
    app_contract: Option<Address>,
    next_id: u64,
    in_tx: bool,
}

impl InMemoryIndexStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Self::default()
        }
    }

    /// Store holding previously committed `entries`.
    #[must_use]
    pub fn restore(entries: Vec<IndexEntry>, app_contract: Option<Address>) -> Self {
        let next_id = entries.iter().map(|e| e.id).max().unwrap_or(0) + 1;
        Self {
            committed: entries,
            app_contract,
            next_id,
            ..Self::default()
        }
    }

    /// Committed entries in insertion order.
    #[must_use]
    pub fn committed(&self) -> &[IndexEntry] {
        &self.committed
    }

    /// Returns true if the open transaction appended or back-filled anything.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty() || self.pending_app_contract.is_some()
    }

    /// Committed plus pending entries, with a pending back-fill applied.
    fn visible(&self) -> Vec<IndexEntry> {
        let mut entries: Vec<IndexEntry> = self
            .committed
            .iter()
            .chain(self.pending.iter())
            .cloned()
            .collect();
        if let Some(app) = self.pending_app_contract {
            for e in &mut entries {
                if e.app_contract.is_none() {
                    e.app_contract = Some(app);
                }
            }
        }
        entries
    }

    fn require_tx(&self) -> Result<(), StorageError> {
        if self.in_tx {
            Ok(())
        } else {
            Err(StorageError::NoTransaction)
        }
    }
}

impl Transactional for InMemoryIndexStore {
    fn begin(&mut self) -> Result<(), StorageError> {
        if self.in_tx {
            return Err(StorageError::TransactionInProgress);
        }
        self.in_tx = true;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StorageError> {
        self.require_tx()?;
        if let Some(app) = self.pending_app_contract.take() {
            let mut updated = 0usize;
            for e in self.committed.iter_mut().filter(|e| e.app_contract.is_none()) {
                e.app_contract = Some(app);
                updated += 1;
            }
            debug!(app_contract = %app, updated, "[rd-03] back-filled app contract");
            self.app_contract = Some(app);
        }
        let appended = self.pending.len();
        self.committed.append(&mut self.pending);
        if appended > 0 {
            debug!(appended, total = self.committed.len(), "[rd-03] committed index entries");
        }
        self.in_tx = false;
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), StorageError> {
        self.require_tx()?;
        if !self.pending.is_empty() {
            debug!(discarded = self.pending.len(), "[rd-03] rolled back index entries");
        }
        // Ids of discarded entries are reused by the next call.
        self.next_id -= self.pending.len() as u64;
        self.pending.clear();
        self.pending_app_contract = None;
        self.in_tx = false;
        Ok(())
    }

    fn in_transaction(&self) -> bool {
        self.in_tx
    }
}

impl IndexStore for InMemoryIndexStore {
    fn append(&mut self, mut entry: IndexEntry) -> Result<u64, IndexError> {
        self.require_tx()?;
        entry.id = self.next_id.max(1);
        self.next_id = entry.id + 1;
        if entry.app_contract.is_none() {
            entry.app_contract = self.pending_app_contract.or(self.app_contract);
        }
        let id = entry.id;
        self.pending.push(entry);
        Ok(id)
    }

    fn backfill_app_contract(&mut self, app_contract: Address) -> Result<usize, IndexError> {
        self.require_tx()?;
        let mut updated = 0usize;
        for e in self.pending.iter_mut().filter(|e| e.app_contract.is_none()) {
            e.app_contract = Some(app_contract);
            updated += 1;
        }
        updated += self
            .committed
            .iter()
            .filter(|e| e.app_contract.is_none())
            .count();
        self.pending_app_contract = Some(app_contract);
        Ok(updated)
    }

    fn app_contract(&self) -> Option<Address> {
        self.app_contract
    }

    fn query(&self, filter: &IndexFilter) -> Result<IndexPage, IndexError> {
        filter.apply(self.visible())
    }

    fn len(&self) -> usize {
        self.committed.len() + self.pending.len()
    }
}
