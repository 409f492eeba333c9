use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

/// Errors raised by a credential store
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("database {0} is already in use by another process")]
    Locked(String),
    #[error("database is closed")]
    Closed,
    #[error("database error: {0}")]
    Database(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Key-value store holding cached session data across runs.
///
/// Every operation after [`Store::close`] fails with [`StorageError::Closed`].
pub trait Store: Send + Sync {
    fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError>;
    fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<bool, StorageError>;
    /// Release the backing resource. Closing twice is a no-op.
    fn close(&self) -> Result<(), StorageError>;
}

/// Opens a store with exclusive ownership of its backing resource
pub trait Storage {
    type Handle: Store;

    fn open(&self) -> Result<Self::Handle, StorageError>;
}

/// Owns an open store and closes it exactly once when dropped.
pub struct StorageGuard<H: Store> {
    handle: Arc<H>,
}

impl<H: Store> StorageGuard<H> {
    pub fn new(handle: H) -> Self {
        Self {
            handle: Arc::new(handle),
        }
    }

    pub fn handle(&self) -> &H {
        &self.handle
    }

    /// Lend the store to a component that lives until the guard drops
    pub fn share(&self) -> Arc<H> {
        Arc::clone(&self.handle)
    }
}

impl<H: Store> Drop for StorageGuard<H> {
    fn drop(&mut self) {
        match self.handle.close() {
            Ok(()) => log::debug!("Storage released"),
            Err(e) => log::warn!("Failed to release storage: {e}"),
        }
    }
}

mod database;
pub use database::{Database, DatabaseOpener};

mod memory;
pub use memory::{MemoryStorage, MemoryStore};
