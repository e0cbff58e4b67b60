//! # File-Backed Index Store
//!
//! Same transaction semantics as [`InMemoryIndexStore`]; committed entries
//! and the recorded application contract are persisted on `flush` as one
//! JSON document, written to a temp file, synced, then renamed over the
//! target.

use super::memory::InMemoryIndexStore;
use crate::domain::{IndexEntry, IndexFilter, IndexPage};
use crate::errors::IndexError;
use crate::ports::IndexStore;
use serde::{Deserialize, Serialize};
use shared_types::{Address, StorageError, Transactional};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// On-disk layout.
#[derive(Debug, Default, Serialize, Deserialize)]
struct IndexFile {
    app_contract: Option<Address>,
    entries: Vec<IndexEntry>,
}

/// Durable index store.
#[derive(Debug)]
pub struct FileBackedIndexStore {
    inner: InMemoryIndexStore,
    path: PathBuf,
    dirty: bool,
}

impl FileBackedIndexStore {
    /// Opens the index at `path`, loading any existing file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let file = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice::<IndexFile>(&bytes)
                .map_err(|e| StorageError::Corrupted(format!("{}: {e}", path.display())))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("[rd-03] 📁 No existing index file at {}", path.display());
                IndexFile::default()
            }
            Err(e) => return Err(StorageError::Io(format!("{}: {e}", path.display()))),
        };
        if !file.entries.is_empty() {
            info!(
                "[rd-03] 💾 Loaded {} index entries from {}",
                file.entries.len(),
                path.display()
            );
        }
        Ok(Self {
            inner: InMemoryIndexStore::restore(file.entries, file.app_contract),
            path,
            dirty: false,
        })
    }

    /// Location of the index file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save_to_file(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }
        let file = IndexFile {
            app_contract: self.inner.app_contract(),
            entries: self.inner.committed().to_vec(),
        };
        let bytes = serde_json::to_vec(&file).map_err(|e| StorageError::Io(e.to_string()))?;

        let temp_path = self.path.with_extension("tmp");
        let mut out = std::fs::File::create(&temp_path).map_err(io_error)?;
        out.write_all(&bytes).map_err(io_error)?;
        out.sync_all().map_err(io_error)?;
        std::fs::rename(&temp_path, &self.path).map_err(io_error)?;

        debug!(entries = file.entries.len(), path = %self.path.display(), "[rd-03] index flushed");
        Ok(())
    }
}

fn io_error(e: std::io::Error) -> StorageError {
    StorageError::Io(e.to_string())
}

impl Transactional for FileBackedIndexStore {
    fn begin(&mut self) -> Result<(), StorageError> {
        self.inner.begin()
    }

    fn commit(&mut self) -> Result<(), StorageError> {
        let changed = self.inner.has_pending();
        self.inner.commit()?;
        self.dirty |= changed;
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), StorageError> {
        self.inner.rollback()
    }

    fn flush(&mut self) -> Result<(), StorageError> {
        if !self.dirty {
            return Ok(());
        }
        self.save_to_file()?;
        self.dirty = false;
        Ok(())
    }

    fn in_transaction(&self) -> bool {
        self.inner.in_transaction()
    }
}

impl IndexStore for FileBackedIndexStore {
    fn append(&mut self, entry: IndexEntry) -> Result<u64, IndexError> {
        self.inner.append(entry)
    }

    fn backfill_app_contract(&mut self, app_contract: Address) -> Result<usize, IndexError> {
        self.inner.backfill_app_contract(app_contract)
    }

    fn app_contract(&self) -> Option<Address> {
        self.inner.app_contract()
    }

    fn query(&self, filter: &IndexFilter) -> Result<IndexPage, IndexError> {
        self.inner.query(filter)
    }

    fn len(&self) -> usize {
        self.inner.len()
    }
}
