// Persistent key-value storage port.
// String-keyed store with an optional byte quota, in-memory or backed by a JSON document on disk.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::warn;

use crate::error::StorageError;

type StorageResult<T> = std::result::Result<T, StorageError>;

/// Synchronous string-keyed storage. Writes may fail with `QuotaExceeded`.
pub trait Storage: Send + Sync {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>>;

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()>;

    fn remove_item(&self, key: &str) -> StorageResult<()>;

    /// Number of stored keys.
    fn len(&self) -> StorageResult<usize>;

    /// Key at `index` in the store's enumeration order.
    fn key(&self, index: usize) -> StorageResult<Option<String>>;

    fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Snapshot of every stored key.
    fn keys(&self) -> StorageResult<Vec<String>> {
        let mut keys = Vec::new();
        for index in 0..self.len()? {
            if let Some(key) = self.key(index)? {
                keys.push(key);
            }
        }
        Ok(keys)
    }
}

/// Map of items with an optional limit on the summed key and value bytes.
#[derive(Debug, Default)]
struct Items {
    map: BTreeMap<String, String>,
    quota: Option<usize>,
}

impl Items {
    fn used_bytes(&self) -> usize {
        self.map.iter().map(|(k, v)| k.len() + v.len()).sum()
    }

    /// Insert, returning the previous value, or fail if the quota would be exceeded.
    fn insert(&mut self, key: &str, value: &str) -> StorageResult<Option<String>> {
        if let Some(quota) = self.quota {
            let replaced = self.map.get(key).map(|old| key.len() + old.len()).unwrap_or(0);
            let projected = self.used_bytes() - replaced + key.len() + value.len();
            if projected > quota {
                return Err(StorageError::QuotaExceeded);
            }
        }
        Ok(self.map.insert(key.to_string(), value.to_string()))
    }

    fn key_at(&self, index: usize) -> Option<String> {
        self.map.keys().nth(index).cloned()
    }
}

fn lock(items: &Mutex<Items>) -> MutexGuard<'_, Items> {
    items.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Process-local storage, used in tests and when no persistent location is available.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<Items>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage that rejects writes once keys plus values exceed `bytes`.
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            items: Mutex::new(Items {
                map: BTreeMap::new(),
                quota: Some(bytes),
            }),
        }
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(lock(&self.items).map.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        lock(&self.items).insert(key, value).map(|_| ())
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        lock(&self.items).map.remove(key);
        Ok(())
    }

    fn len(&self) -> StorageResult<usize> {
        Ok(lock(&self.items).map.len())
    }

    fn key(&self, index: usize) -> StorageResult<Option<String>> {
        Ok(lock(&self.items).key_at(index))
    }
}

/// Storage persisted as a single JSON document, rewritten on every mutation.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    items: Mutex<Items>,
}

impl FileStorage {
    /// Open (or lazily create) the document at `path`.
    /// A corrupt document is discarded and the store starts empty.
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        let map = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!(path = %path.display(), error = %err, "Discarding corrupt storage document");
                BTreeMap::new()
            })
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path,
            items: Mutex::new(Items { map, quota: None }),
        })
    }

    /// Open the document at the platform cache location.
    pub fn open_default() -> StorageResult<Self> {
        let path = super::paths::storage_path().ok_or_else(|| {
            StorageError::Unavailable("no cache directory for this platform".to_string())
        })?;
        Self::open(path)
    }

    pub fn with_quota(self, bytes: usize) -> Self {
        lock(&self.items).quota = Some(bytes);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the document atomically via a temp file.
    fn persist(&self, map: &BTreeMap<String, String>) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string(map)?;
        let temp_path = self.path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;
        fs::rename(&temp_path, &self.path)?;

        Ok(())
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(lock(&self.items).map.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut items = lock(&self.items);
        let previous = items.insert(key, value)?;

        if let Err(err) = self.persist(&items.map) {
            // Keep memory and disk in agreement
            match previous {
                Some(old) => items.map.insert(key.to_string(), old),
                None => items.map.remove(key),
            };
            return Err(err);
        }
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        let mut items = lock(&self.items);
        if let Some(old) = items.map.remove(key) {
            if let Err(err) = self.persist(&items.map) {
                items.map.insert(key.to_string(), old);
                return Err(err);
            }
        }
        Ok(())
    }

    fn len(&self) -> StorageResult<usize> {
        Ok(lock(&self.items).map.len())
    }

    fn key(&self, index: usize) -> StorageResult<Option<String>> {
        Ok(lock(&self.items).key_at(index))
    }
}

/// Open persistent storage at `path`, or at the platform cache location when
/// `path` is `None`. Falls back to process-local storage when neither works.
pub fn open_persistent(path: Option<&Path>) -> Arc<dyn Storage> {
    let opened = match path {
        Some(path) => FileStorage::open(path),
        None => FileStorage::open_default(),
    };

    match opened {
        Ok(storage) => Arc::new(storage),
        Err(err) => {
            warn!(error = %err, "Persistent storage unavailable, caching in memory only");
            Arc::new(MemoryStorage::new())
        }
    }
}
