//! Small durable key-value store for client flags that must survive a
//! reload: the first-time indexing marker and the installation id.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use precept_core::ClientConfig;
use tracing::warn;
use uuid::Uuid;

use crate::error::StorageError;

pub const FIRST_TIME_INDEXING_KEY: &str = "first_time_indexing";
pub const INSTALLATION_ID_KEY: &str = "uuid";

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(lock(&self.entries).get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        lock(&self.entries).insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        lock(&self.entries).remove(key);
        Ok(())
    }
}

/// JSON object on disk, rewritten atomically on every change.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let entries: BTreeMap<String, String> = if path.exists() {
            let content = fs::read(path)?;
            serde_json::from_slice(&content)?
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            path: path.to_path_buf(),
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_atomic(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp_path = self.path.with_extension("tmp");
        {
            let mut file = fs::File::create(&tmp_path)?;
            let data = serde_json::to_vec_pretty(entries)?;
            file.write_all(&data)?;
            file.sync_all()?;
        }
        fs::rename(tmp_path, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(lock(&self.entries).get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = lock(&self.entries);
        let mut updated = entries.clone();
        updated.insert(key.to_string(), value.to_string());
        self.write_atomic(&updated)?;
        *entries = updated;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = lock(&self.entries);
        if !entries.contains_key(key) {
            return Ok(());
        }
        let mut updated = entries.clone();
        updated.remove(key);
        self.write_atomic(&updated)?;
        *entries = updated;
        Ok(())
    }
}

/// File-backed when `storage_path` is configured, in-memory otherwise.
pub fn open_store(config: &ClientConfig) -> Result<Arc<dyn KeyValueStore>, StorageError> {
    match &config.storage_path {
        Some(path) => Ok(Arc::new(FileStore::open(path)?)),
        None => Ok(Arc::new(MemoryStore::new())),
    }
}

/// Stable per-installation id, generated on first use.
pub fn installation_id(store: &dyn KeyValueStore) -> Result<Uuid, StorageError> {
    if let Some(value) = store.get(INSTALLATION_ID_KEY)? {
        match Uuid::parse_str(&value) {
            Ok(id) => return Ok(id),
            Err(err) => warn!("discarding malformed installation id {value:?}: {err}"),
        }
    }
    let id = Uuid::new_v4();
    store.set(INSTALLATION_ID_KEY, &id.to_string())?;
    Ok(id)
}
