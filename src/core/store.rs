//! Persistent Key-Value Store
//!
//! Durable mapping from string key to JSON value. The ledgers own no storage
//! of their own; they read-modify-write records through a [`KeyValueStore`].

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying file system failure.
    #[error("storage I/O error: {0}")]
    Io(#[from] io::Error),

    /// Value could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Key cannot be mapped to a storage location.
    #[error("invalid key: {0}")]
    InvalidKey(String),
}

/// Durable string-keyed JSON storage.
///
/// Implementations must survive process restarts (except [`MemoryStore`],
/// which exists for tests and embedding).
pub trait KeyValueStore {
    /// Load the value stored under `key`, or `None` when absent.
    fn load(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Store `value` under `key`, replacing any previous value.
    fn save(&self, key: &str, value: &Value) -> Result<(), StoreError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &S {
    fn load(&self, key: &str) -> Result<Option<Value>, StoreError> {
        (**self).load(key)
    }

    fn save(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        (**self).save(key, value)
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Arc<S> {
    fn load(&self, key: &str) -> Result<Option<Value>, StoreError> {
        (**self).load(key)
    }

    fn save(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        (**self).save(key, value)
    }
}

/// Load and decode a typed record.
///
/// Missing, unreadable and malformed records all come back as `None`; the
/// caller replaces them with a fresh record.
pub fn load_record<T, S>(store: &S, key: &str) -> Option<T>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    let value = match store.load(key) {
        Ok(Some(value)) => value,
        Ok(None) => return None,
        Err(e) => {
            warn!("Failed to read {}: {}", key, e);
            return None;
        }
    };

    match serde_json::from_value(value) {
        Ok(record) => Some(record),
        Err(e) => {
            debug!("Discarding malformed record {}: {}", key, e);
            None
        }
    }
}

/// Encode and save a typed record, logging instead of failing.
///
/// Returns whether the write reached the store.
pub fn save_record<T, S>(store: &S, key: &str, record: &T) -> bool
where
    T: Serialize,
    S: KeyValueStore + ?Sized,
{
    let result = serde_json::to_value(record)
        .map_err(StoreError::from)
        .and_then(|value| store.save(key, &value));

    match result {
        Ok(()) => true,
        Err(e) => {
            warn!("Failed to persist {}: {}", key, e);
            false
        }
    }
}

/// In-memory store. Not durable.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, Value>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently held.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Check if nothing has been stored.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Value>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.lock().get(key).cloned())
    }

    fn save(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        self.lock().insert(key.to_string(), value.clone());
        Ok(())
    }
}

/// File-backed store: one pretty-printed JSON file per key.
///
/// Writes go to a temporary file that is renamed over the target, so a crash
/// mid-write leaves the previous value intact.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Directory holding the records.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
            && !key.starts_with('.');
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for FileStore {
    fn load(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let path = self.path_for(key)?;
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    fn save(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(value)?)?;
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }
}

/// Store whose writes start failing after a set number of saves.
#[cfg(test)]
#[derive(Debug)]
pub(crate) struct FlakyStore {
    inner: MemoryStore,
    saves_left: Mutex<usize>,
}

#[cfg(test)]
impl FlakyStore {
    /// Allow `saves` writes, then fail every one after.
    pub(crate) fn failing_after(saves: usize) -> Self {
        Self {
            inner: MemoryStore::new(),
            saves_left: Mutex::new(saves),
        }
    }

    /// Fail every write from now on.
    pub(crate) fn break_writes(&self) {
        *self.saves_left.lock().unwrap() = 0;
    }
}

#[cfg(test)]
impl KeyValueStore for FlakyStore {
    fn load(&self, key: &str) -> Result<Option<Value>, StoreError> {
        self.inner.load(key)
    }

    fn save(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        let mut left = self.saves_left.lock().unwrap();
        if *left == 0 {
            return Err(io::Error::new(io::ErrorKind::Other, "disk full").into());
        }
        *left -= 1;
        self.inner.save(key, value)
    }
}

// =============================================================================
// TESTS
// =============================================================================
