//! Persistent key-value storage with guarded access.
//!
//! The aggregation store never talks to a backend directly: every access
//! goes through [`GuardedStorage`], which catches backend failures, logs
//! them, and degrades to defaults (reads) or no-ops (writes). Callers treat
//! every accumulation attempt as best-effort.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::StorageError;

/// A key-value storage backend holding JSON values.
///
/// Implementations must be safe to share across threads; the aggregation
/// store serializes its own read-modify-write cycles above this trait.
pub trait StorageBackend: Send + Sync + fmt::Debug {
    /// Load the value stored under `key`, if any.
    fn load(&self, key: &str) -> Result<Option<Value>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    fn store(&self, key: &str, value: Value) -> Result<(), StorageError>;

    /// Remove the given keys. Missing keys are not an error.
    fn remove(&self, keys: &[String]) -> Result<(), StorageError>;

    /// All currently stored keys.
    fn keys(&self) -> Result<Vec<String>, StorageError>;

    /// Whether the backend is reachable in this execution context.
    fn is_available(&self) -> bool {
        true
    }
}

/// In-memory backend for tests and ephemeral contexts.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: RwLock<BTreeMap<String, Value>>,
    unavailable: AtomicBool,
}

impl MemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the backend becoming (un)reachable.
    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::Relaxed);
    }
}

impl StorageBackend for MemoryBackend {
    fn load(&self, key: &str) -> Result<Option<Value>, StorageError> {
        if !self.is_available() {
            return Err(StorageError::Unavailable);
        }
        Ok(self.entries.read().get(key).cloned())
    }

    fn store(&self, key: &str, value: Value) -> Result<(), StorageError> {
        if !self.is_available() {
            return Err(StorageError::Unavailable);
        }
        self.entries.write().insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, keys: &[String]) -> Result<(), StorageError> {
        if !self.is_available() {
            return Err(StorageError::Unavailable);
        }
        let mut entries = self.entries.write();
        for key in keys {
            entries.remove(key);
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        if !self.is_available() {
            return Err(StorageError::Unavailable);
        }
        Ok(self.entries.read().keys().cloned().collect())
    }

    fn is_available(&self) -> bool {
        !self.unavailable.load(Ordering::Relaxed)
    }
}

/// File-backed storage: one JSON object document holding every key.
///
/// The whole document is read before and rewritten after each mutation.
/// That is fine at the write rates this engine sees (one write per
/// completed chat request) and keeps the on-disk form inspectable.
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    /// Create a backend persisting to the given path.
    ///
    /// The file is created on first write; a missing file reads as empty.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// The path being persisted to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Result<BTreeMap<String, Value>, StorageError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Ok(BTreeMap::new());
            }
            Err(error) => return Err(error.into()),
        };
        match serde_json::from_str(&content) {
            Ok(document) => Ok(document),
            Err(error) => {
                // A corrupt document is treated as absent rather than fatal.
                warn!(path = %self.path.display(), %error, "footprint document unreadable, starting empty");
                Ok(BTreeMap::new())
            }
        }
    }

    fn write_document(&self, document: &BTreeMap<String, Value>) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(document)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

impl StorageBackend for FileBackend {
    fn load(&self, key: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.read_document()?.remove(key))
    }

    fn store(&self, key: &str, value: Value) -> Result<(), StorageError> {
        let mut document = self.read_document()?;
        document.insert(key.to_string(), value);
        self.write_document(&document)
    }

    fn remove(&self, keys: &[String]) -> Result<(), StorageError> {
        let mut document = self.read_document()?;
        let mut changed = false;
        for key in keys {
            changed |= document.remove(key).is_some();
        }
        if changed {
            self.write_document(&document)?;
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.read_document()?.into_keys().collect())
    }
}

/// The sole gateway to a storage backend.
///
/// Consolidates availability checks and failure handling in one place:
/// reads degrade to `None` and writes to no-ops, with the failure logged.
/// Values that do not parse as the expected shape read as absent.
#[derive(Debug, Clone)]
pub struct GuardedStorage {
    backend: Arc<dyn StorageBackend>,
}

impl GuardedStorage {
    /// Wrap a backend.
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Whether the underlying backend is reachable.
    pub fn is_available(&self) -> bool {
        self.backend.is_available()
    }

    /// Read and decode a value. Any failure reads as absent.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        if !self.backend.is_available() {
            debug!(key, "storage unavailable, returning default");
            return None;
        }
        let value = match self.backend.load(key) {
            Ok(value) => value?,
            Err(error) => {
                warn!(key, %error, "storage read failed");
                return None;
            }
        };
        match serde_json::from_value(value) {
            Ok(decoded) => Some(decoded),
            Err(error) => {
                warn!(key, %error, "stored value has unexpected shape, treating as absent");
                None
            }
        }
    }

    /// Encode and store a value. Returns whether the write landed.
    pub fn put<T: Serialize>(&self, key: &str, value: &T) -> bool {
        if !self.backend.is_available() {
            debug!(key, "storage unavailable, dropping write");
            return false;
        }
        let encoded = match serde_json::to_value(value) {
            Ok(encoded) => encoded,
            Err(error) => {
                warn!(key, %error, "value failed to encode");
                return false;
            }
        };
        match self.backend.store(key, encoded) {
            Ok(()) => true,
            Err(error) => {
                warn!(key, %error, "storage write failed");
                false
            }
        }
    }

    /// Remove keys. Returns whether the removal landed.
    pub fn remove(&self, keys: &[String]) -> bool {
        if !self.backend.is_available() {
            return false;
        }
        match self.backend.remove(keys) {
            Ok(()) => true,
            Err(error) => {
                warn!(%error, "storage remove failed");
                false
            }
        }
    }

    /// All stored keys, or empty on failure.
    pub fn keys(&self) -> Vec<String> {
        if !self.backend.is_available() {
            return Vec::new();
        }
        match self.backend.keys() {
            Ok(keys) => keys,
            Err(error) => {
                warn!(%error, "storage key listing failed");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn memory_backend_round_trip() {
        let backend = MemoryBackend::new();
        backend.store("k", json!({"requests": 3})).unwrap();
        assert_eq!(backend.load("k").unwrap(), Some(json!({"requests": 3})));
        assert_eq!(backend.load("missing").unwrap(), None);

        backend.remove(&["k".to_string()]).unwrap();
        assert_eq!(backend.load("k").unwrap(), None);
    }

    #[test]
    fn memory_backend_unavailable_errors() {
        let backend = MemoryBackend::new();
        backend.set_available(false);
        assert!(backend.load("k").is_err());
        assert!(backend.store("k", json!(1)).is_err());
        backend.set_available(true);
        assert!(backend.store("k", json!(1)).is_ok());
    }

    #[test]
    fn guarded_get_returns_none_on_unavailable_backend() {
        let backend = Arc::new(MemoryBackend::new());
        backend.set_available(false);
        let storage = GuardedStorage::new(backend.clone());

        assert!(!storage.is_available());
        assert_eq!(storage.get::<u64>("k"), None);
        assert!(!storage.put("k", &42u64));
        assert!(storage.keys().is_empty());
    }

    #[test]
    fn guarded_get_treats_wrong_shape_as_absent() {
        let backend = Arc::new(MemoryBackend::new());
        backend.store("k", json!("not a number")).unwrap();
        let storage = GuardedStorage::new(backend);

        assert_eq!(storage.get::<u64>("k"), None);
    }

    #[test]
    fn guarded_put_then_get() {
        let storage = GuardedStorage::new(Arc::new(MemoryBackend::new()));
        assert!(storage.put("count", &7u64));
        assert_eq!(storage.get::<u64>("count"), Some(7));
    }

    #[test]
    fn file_backend_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path().join("footprints.json"));

        backend.store("a", json!({"requests": 1})).unwrap();
        backend.store("b", json!(2)).unwrap();

        assert_eq!(backend.load("a").unwrap(), Some(json!({"requests": 1})));
        let mut keys = backend.keys().unwrap();
        keys.sort();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);

        backend.remove(&["a".to_string()]).unwrap();
        assert_eq!(backend.load("a").unwrap(), None);
        assert_eq!(backend.load("b").unwrap(), Some(json!(2)));
    }

    #[test]
    fn file_backend_missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path().join("never-written.json"));
        assert_eq!(backend.load("k").unwrap(), None);
        assert!(backend.keys().unwrap().is_empty());
    }

    #[test]
    fn file_backend_corrupt_document_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("footprints.json");
        fs::write(&path, "{ not json").unwrap();

        let backend = FileBackend::new(&path);
        assert_eq!(backend.load("k").unwrap(), None);

        // Writing after corruption starts a fresh document.
        backend.store("k", json!(1)).unwrap();
        assert_eq!(backend.load("k").unwrap(), Some(json!(1)));
    }
}
