use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use super::{Storage, StorageError, Store};

/// In-memory storage shared by every handle opened from it.
///
/// Only one handle may be open at a time, like the file database.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    values: Arc<RwLock<HashMap<String, serde_json::Value>>>,
    in_use: Arc<AtomicBool>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Peek at a value without opening a handle
    pub fn snapshot<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let values = self.values.read().ok()?;
        values
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }
}

impl Storage for MemoryStorage {
    type Handle = MemoryStore;

    fn open(&self) -> Result<MemoryStore, StorageError> {
        if self.in_use.swap(true, Ordering::SeqCst) {
            return Err(StorageError::Locked("memory".to_string()));
        }
        Ok(MemoryStore {
            values: Arc::clone(&self.values),
            in_use: Arc::clone(&self.in_use),
            open: AtomicBool::new(true),
        })
    }
}

#[derive(Debug)]
pub struct MemoryStore {
    values: Arc<RwLock<HashMap<String, serde_json::Value>>>,
    in_use: Arc<AtomicBool>,
    open: AtomicBool,
}

impl MemoryStore {
    fn ensure_open(&self) -> Result<(), StorageError> {
        if self.open.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StorageError::Closed)
        }
    }
}

impl Store for MemoryStore {
    fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        self.ensure_open()?;
        let values = self
            .values
            .read()
            .map_err(|e| StorageError::Database(e.to_string()))?;
        values
            .get(key)
            .map(|value| serde_json::from_value(value.clone()))
            .transpose()
            .map_err(|e| StorageError::Serialization(e.to_string()))
    }

    fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        self.ensure_open()?;
        let value =
            serde_json::to_value(value).map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.values
            .write()
            .map_err(|e| StorageError::Database(e.to_string()))?
            .insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool, StorageError> {
        self.ensure_open()?;
        Ok(self
            .values
            .write()
            .map_err(|e| StorageError::Database(e.to_string()))?
            .remove(key)
            .is_some())
    }

    fn close(&self) -> Result<(), StorageError> {
        if self.open.swap(false, Ordering::SeqCst) {
            self.in_use.store(false, Ordering::SeqCst);
        }
        Ok(())
    }
}
