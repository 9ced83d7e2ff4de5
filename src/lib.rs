//! # meshdb - Mesh network persistence
//!
//! Local storage for a mesh-network management application.
//!
//! meshdb provides:
//! - Network settings (credential, TTL, id allocation counters)
//! - A registry of addressable devices with their capability bitmaps
//! - A registry of logical groups
//! - Device ↔ group membership, kept in sync on every device upsert
//! - SQLite-backed storage with forward schema migrations

pub mod setting;
pub mod device;
pub mod group;
pub mod storage;
pub mod config;
pub mod ui;

// Re-exports for convenient access
pub use setting::Setting;
pub use device::{DeviceId, SingleDevice};
pub use group::{GroupDevice, GroupId};
pub use storage::{Database, MeshStore};

/// Result type alias for meshdb operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for meshdb operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("IO failure: {0}")]
    Io(String),

    #[error("Schema version mismatch: database is at version {found}, this build supports up to {expected}")]
    SchemaMismatch { found: i64, expected: i64 },

    #[error("Invalid row id: write to `{0}` did not produce a row")]
    InvalidRowId(&'static str),

    #[error("Database connection lock poisoned")]
    ConnectionPoisoned,

    #[error("Storage error: {0}")]
    Storage(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        use rusqlite::ErrorCode;

        let failure = match &err {
            rusqlite::Error::SqliteFailure(e, msg) => {
                Some((e.code, msg.clone().unwrap_or_else(|| e.to_string())))
            }
            _ => None,
        };

        match failure {
            Some((ErrorCode::ConstraintViolation, detail)) => Error::ConstraintViolation(detail),
            Some((
                ErrorCode::CannotOpen
                | ErrorCode::DatabaseCorrupt
                | ErrorCode::NotADatabase
                | ErrorCode::DiskFull
                | ErrorCode::SystemIoFailure
                | ErrorCode::ReadOnly,
                detail,
            )) => Error::Io(detail),
            _ => Error::Storage(err),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}
