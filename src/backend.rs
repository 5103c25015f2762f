//! Explicitly constructed backend handle.
//!
//! Bundles the relational store, the object store and the public origin.
//! Every operation receives a `&Backend`; there is no process-global client.
//! `Backend::in_memory` gives tests a fresh SQLite database and a map-backed
//! object store.

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;

use crate::config::ServerConfig;
use crate::db::{self, DatabaseError};
use crate::storage::{LocalObjectStore, MemoryObjectStore, ObjectStore, StorageError};

/// Errors from acquiring backend resources.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("Internal lock error")]
    LockPoisoned,
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Background task failed: {0}")]
    Task(String),
}

pub struct Backend {
    conn: Mutex<Connection>,
    storage: Arc<dyn ObjectStore>,
    public_origin: String,
}

impl Backend {
    /// Assemble a backend from already-opened parts.
    pub fn new(conn: Connection, storage: Arc<dyn ObjectStore>, public_origin: &str) -> Self {
        Self {
            conn: Mutex::new(conn),
            storage,
            public_origin: public_origin.trim_end_matches('/').to_string(),
        }
    }

    /// File database + filesystem object store, as configured.
    pub fn open(config: &ServerConfig) -> Result<Self, BackendError> {
        let conn = db::open_database(&config.db_path)?;
        let storage = LocalObjectStore::new(&config.storage_dir, &config.public_origin)?;
        tracing::info!(
            db = %config.db_path.display(),
            storage = %config.storage_dir.display(),
            "Backend opened"
        );
        Ok(Self::new(conn, Arc::new(storage), &config.public_origin))
    }

    /// In-memory database + in-memory object store.
    pub fn in_memory(public_origin: &str) -> Result<Self, DatabaseError> {
        let conn = db::open_memory_database()?;
        let storage = MemoryObjectStore::new(public_origin);
        Ok(Self::new(conn, Arc::new(storage), public_origin))
    }

    /// Lock the connection for the duration of one operation.
    pub fn conn(&self) -> Result<MutexGuard<'_, Connection>, BackendError> {
        self.conn.lock().map_err(|_| BackendError::LockPoisoned)
    }

    pub fn storage(&self) -> &dyn ObjectStore {
        self.storage.as_ref()
    }

    pub fn public_origin(&self) -> &str {
        &self.public_origin
    }
}
