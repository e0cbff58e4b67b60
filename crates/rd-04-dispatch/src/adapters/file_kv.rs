//! # File-Backed Key-Value Store
//!
//! Committed state is kept in memory and persisted on `flush` as
//! `[key_len:u32 LE][key][value_len:u32 LE][value]...`, written to a temp
//! file, synced, then renamed over the target.

use super::overlay::Overlay;
use crate::ports::outbound::{KeyValueStore, ScanResult};
use shared_types::{StorageError, Transactional};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Durable transactional key-value store.
#[derive(Debug)]
pub struct FileBackedKVStore {
    data: Overlay,
    path: PathBuf,
    dirty: bool,
}

impl FileBackedKVStore {
    /// Opens the store at `path`, loading any existing file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let committed = match std::fs::read(&path) {
            Ok(bytes) => decode_entries(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("[rd-04] 📁 No existing storage file at {}", path.display());
                BTreeMap::new()
            }
            Err(e) => return Err(StorageError::Io(format!("{}: {e}", path.display()))),
        };
        if !committed.is_empty() {
            info!(
                "[rd-04] 💾 Loaded {} keys from {}",
                committed.len(),
                path.display()
            );
        }
        Ok(Self {
            data: Overlay::with_committed(committed),
            path,
            dirty: false,
        })
    }

    /// Location of the storage file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save_to_file(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }
        let bytes = encode_entries(self.data.committed());

        let temp_path = self.path.with_extension("tmp");
        let mut file = std::fs::File::create(&temp_path).map_err(io_error)?;
        file.write_all(&bytes).map_err(io_error)?;
        file.sync_all().map_err(io_error)?;
        std::fs::rename(&temp_path, &self.path).map_err(io_error)?;

        debug!(bytes = bytes.len(), path = %self.path.display(), "[rd-04] storage flushed");
        Ok(())
    }
}

fn io_error(e: std::io::Error) -> StorageError {
    StorageError::Io(e.to_string())
}

fn encode_entries(map: &BTreeMap<Vec<u8>, Vec<u8>>) -> Vec<u8> {
    let mut bytes = Vec::new();
    for (key, value) in map {
        bytes.extend_from_slice(&(key.len() as u32).to_le_bytes());
        bytes.extend_from_slice(key);
        bytes.extend_from_slice(&(value.len() as u32).to_le_bytes());
        bytes.extend_from_slice(value);
    }
    bytes
}

fn decode_entries(bytes: &[u8]) -> Result<BTreeMap<Vec<u8>, Vec<u8>>, StorageError> {
    let mut data = BTreeMap::new();
    let mut cursor = 0usize;
    while cursor < bytes.len() {
        let key = read_chunk(bytes, &mut cursor)?;
        let value = read_chunk(bytes, &mut cursor)?;
        data.insert(key, value);
    }
    Ok(data)
}

fn read_chunk(bytes: &[u8], cursor: &mut usize) -> Result<Vec<u8>, StorageError> {
    let corrupted = || StorageError::Corrupted(format!("truncated record at byte {cursor}"));
    let len_bytes: [u8; 4] = bytes
        .get(*cursor..*cursor + 4)
        .and_then(|b| b.try_into().ok())
        .ok_or_else(corrupted)?;
    let len = u32::from_le_bytes(len_bytes) as usize;
    let start = *cursor + 4;
    let chunk = bytes.get(start..start + len).ok_or_else(corrupted)?.to_vec();
    *cursor = start + len;
    Ok(chunk)
}

impl Transactional for FileBackedKVStore {
    fn begin(&mut self) -> Result<(), StorageError> {
        self.data.begin()
    }

    fn commit(&mut self) -> Result<(), StorageError> {
        if self.data.commit()? > 0 {
            self.dirty = true;
        }
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), StorageError> {
        self.data.rollback().map(|_| ())
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
        self.data.in_tx()
    }
}

impl KeyValueStore for FileBackedKVStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.data.get(key))
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        self.data.put(key, value)
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), StorageError> {
        self.data.delete(key)
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<ScanResult, StorageError> {
        Ok(self.data.prefix_scan(prefix))
    }
}
