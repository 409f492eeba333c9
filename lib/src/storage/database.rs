use pickledb::{PickleDb, PickleDbDumpPolicy, SerializationMethod};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{File, OpenOptions, TryLockError};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use super::{Storage, StorageError, Store};

/// Opens the PickleDB file at a fixed path
#[derive(Debug, Clone)]
pub struct DatabaseOpener {
    path: PathBuf,
}

impl DatabaseOpener {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Storage for DatabaseOpener {
    type Handle = Database;

    fn open(&self) -> Result<Database, StorageError> {
        Database::open(&self.path)
    }
}

struct OpenDatabase {
    db: PickleDb,
    lock: File,
}

/// PickleDB-based file store, exclusively locked while open
pub struct Database {
    path: PathBuf,
    inner: Mutex<Option<OpenDatabase>>,
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path_ref = path.as_ref();

        if let Some(parent) = path_ref.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        // Lock before touching the data file so a second opener never reads a half-written dump
        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(Self::lock_path(path_ref))?;
        match lock.try_lock() {
            Ok(()) => {}
            Err(TryLockError::WouldBlock) => {
                return Err(StorageError::Locked(path_ref.display().to_string()));
            }
            Err(TryLockError::Error(e)) => return Err(StorageError::Io(e)),
        }

        let db = if path_ref.exists() {
            PickleDb::load(
                path_ref,
                PickleDbDumpPolicy::AutoDump,
                SerializationMethod::Json,
            )
            .map_err(|e| StorageError::Database(e.to_string()))?
        } else {
            let mut db = PickleDb::new(
                path_ref,
                PickleDbDumpPolicy::AutoDump,
                SerializationMethod::Json,
            );
            db.dump()
                .map_err(|e| StorageError::Database(e.to_string()))?;
            log::info!("Created new database at {}", path_ref.display());
            db
        };

        log::debug!("Opened database {}", path_ref.display());
        Ok(Self {
            path: path_ref.to_path_buf(),
            inner: Mutex::new(Some(OpenDatabase { db, lock })),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(path: &Path) -> PathBuf {
        let mut name = path.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }

    fn state(&self) -> Result<MutexGuard<'_, Option<OpenDatabase>>, StorageError> {
        self.inner
            .lock()
            .map_err(|e| StorageError::Database(format!("lock poisoned: {e}")))
    }
}

impl Store for Database {
    fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        let state = self.state()?;
        let open = state.as_ref().ok_or(StorageError::Closed)?;
        Ok(open.db.get(key))
    }

    fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let mut state = self.state()?;
        let open = state.as_mut().ok_or(StorageError::Closed)?;
        open.db
            .set(key, value)
            .map_err(|e| StorageError::Serialization(e.to_string()))
    }

    fn remove(&self, key: &str) -> Result<bool, StorageError> {
        let mut state = self.state()?;
        let open = state.as_mut().ok_or(StorageError::Closed)?;
        open.db
            .rem(key)
            .map_err(|e| StorageError::Database(e.to_string()))
    }

    fn close(&self) -> Result<(), StorageError> {
        let Some(mut open) = self.state()?.take() else {
            return Ok(());
        };

        let dumped = open
            .db
            .dump()
            .map_err(|e| StorageError::Database(e.to_string()));
        open.lock.unlock()?;
        log::debug!("Closed database {}", self.path.display());
        dumped
    }
}
