use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};
use crate::ledger::LedgerSnapshot;

/// Schema version written with every persisted blob
///
/// Blobs written before versioning existed deserialize as version 0 and share
/// the version 1 layout.
pub const SCHEMA_VERSION: u32 = 1;

/// The blob stored under the storage key
///
/// ```json
/// {"version": 1, "state": {"user": {...}, "wallet": {...}, "isAuthenticated": true, ...}}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default)]
    pub version: u32,
    pub state: LedgerSnapshot,
}

impl PersistedState {
    /// Wrap a snapshot with the current schema version
    pub fn current(state: LedgerSnapshot) -> Self {
        Self {
            version: SCHEMA_VERSION,
            state,
        }
    }
}

/// Key/value storage for the serialized ledger
///
/// Mirrors browser local storage: string keys, string values, one blob per key.
///
/// # Example
///
/// ```
/// use wallet_ledger::persistence::{MemoryStorage, StorageBackend};
///
/// let mut storage = MemoryStorage::new();
/// storage.set_item("wallet-storage", "{}".to_string()).unwrap();
///
/// assert_eq!(
///     storage.get_item("wallet-storage").unwrap().as_deref(),
///     Some("{}")
/// );
/// ```
pub trait StorageBackend: Send + Sync {
    /// Read the value under `key`, `None` if absent
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value under `key`
    fn set_item(&mut self, key: &str, value: String) -> Result<()>;

    /// Delete `key`; deleting a missing key is not an error
    fn remove_item(&mut self, key: &str) -> Result<()>;
}

/// In-memory storage
///
/// Used by tests and by the CLI when no state directory is given.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
    write_count: usize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `set_item` calls
    pub fn write_count(&self) -> usize {
        self.write_count
    }
}

impl StorageBackend for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: String) -> Result<()> {
        self.items.insert(key.to_string(), value);
        self.write_count += 1;
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        self.items.remove(key);
        Ok(())
    }
}

/// File-backed storage: each key is stored as `<dir>/<key>.json`
///
/// Keys must be plain file names: empty keys, `.`/`..`, and keys containing
/// path separators are refused with `InvalidStorageKey`.
///
/// Writes go to a temporary sibling first and are renamed into place, so a
/// crash mid-write leaves the previous blob intact.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Open (and create if needed) a storage directory
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let is_plain_name = !key.is_empty()
            && key != "."
            && key != ".."
            && !key.contains(['/', '\\'])
            && !Path::new(key).has_root();
        if !is_plain_name {
            return Err(LedgerError::InvalidStorageKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl StorageBackend for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)?) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set_item(&mut self, key: &str, value: String) -> Result<()> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)?) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
