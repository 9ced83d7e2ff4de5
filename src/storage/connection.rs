//! Connection management
//!
//! One long-lived SQLite connection guarded by a mutex. Stores borrow it for
//! the duration of a single logical operation; the guard is released on
//! every exit path when it drops.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::{Connection, Transaction};

use super::schema::{SchemaManager, SchemaStatus};
use crate::{Error, Result};

/// Owner of the embedded database connection
#[derive(Debug)]
pub struct Database {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl Database {
    /// Open a database file (creates it and its parent directory if needed)
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        tracing::debug!("Opened database {}", path.display());
        Self::from_connection(conn, Some(path.to_path_buf()))
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn, None)
    }

    fn from_connection(mut conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        match SchemaManager::initialize(&mut conn)? {
            SchemaStatus::Created => tracing::info!("Created mesh database schema"),
            SchemaStatus::Migrated { from, to } => {
                tracing::info!("Migrated mesh database schema from v{} to v{}", from, to)
            }
            SchemaStatus::UpToDate => {}
        }

        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    /// Path backing this database, `None` for in-memory databases
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// How long to wait on a lock held by another process before failing
    pub fn set_busy_timeout(&self, timeout: Duration) -> Result<()> {
        self.lock()?.busy_timeout(timeout)?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| Error::ConnectionPoisoned)
    }

    /// Run `f` with exclusive access to the connection
    pub fn with_connection<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self.lock()?;
        f(&conn)
    }

    /// Run `f` inside a transaction.
    ///
    /// Commits when `f` returns `Ok`; any error rolls back every statement
    /// `f` executed.
    pub fn with_transaction<T>(&self, f: impl FnOnce(&Transaction<'_>) -> Result<T>) -> Result<T> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }
}
