//! Database schema definitions and forward migrations
//!
//! The applied version lives in `PRAGMA user_version`. Each migration step
//! is idempotent so databases created before versioning (version 0 with the
//! tables already present) upgrade cleanly.

use crate::{Error, Result};
use rusqlite::Connection;

/// Latest schema version known to this build
pub const SCHEMA_VERSION: i64 = 2;

/// SQL to create the settings table
pub const CREATE_SETTINGS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS settings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    key TEXT,
    next_device_index INTEGER,
    next_group_index INTEGER,
    auth_required INTEGER,
    ttl INTEGER
)
"#;

/// SQL to create the devices table
pub const CREATE_DEVICES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS devices (
    id INTEGER PRIMARY KEY,
    name TEXT,
    hash INTEGER,
    modelsupport_low INTEGER,
    modelsupport_high INTEGER,
    groups_supported INTEGER,
    settings_id INTEGER
)
"#;

/// SQL to create the groups table
pub const CREATE_GROUPS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS "groups" (
    id INTEGER PRIMARY KEY,
    name TEXT,
    settings_id INTEGER
)
"#;

/// SQL to create the device/group junction table
/// One row per (device, group) pair; re-adding a pair replaces it
pub const CREATE_MODELS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS models (
    device_id INTEGER NOT NULL,
    group_id INTEGER NOT NULL,
    UNIQUE(device_id, group_id) ON CONFLICT REPLACE
)
"#;

/// SQL to create lookup indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_models_group ON models(group_id)",
    "CREATE INDEX IF NOT EXISTS idx_devices_settings ON devices(settings_id)",
    "CREATE INDEX IF NOT EXISTS idx_groups_settings ON \"groups\"(settings_id)",
];

/// Tables in the order a full wipe clears them
pub const ALL_TABLES: &[&str] = &["settings", "\"groups\"", "devices", "models"];

/// A forward migration step
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub version: i64,
    pub description: &'static str,
    pub statements: &'static [&'static str],
}

/// All migrations, ascending by version
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "create settings, devices, groups and models tables",
        statements: &[
            CREATE_SETTINGS_TABLE,
            CREATE_DEVICES_TABLE,
            CREATE_GROUPS_TABLE,
            CREATE_MODELS_TABLE,
        ],
    },
    Migration {
        version: 2,
        description: "add lookup indexes",
        statements: CREATE_INDEXES,
    },
];

/// Outcome of bringing a database up to date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaStatus {
    /// Fresh database, all migrations applied
    Created,
    /// Existing database moved forward
    Migrated { from: i64, to: i64 },
    /// Nothing to do
    UpToDate,
}

/// Creates and upgrades the schema
pub struct SchemaManager;

impl SchemaManager {
    /// Read the version recorded in the database file
    pub fn current_version(conn: &Connection) -> Result<i64> {
        let version = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
        Ok(version)
    }

    /// Apply every migration newer than the recorded version in one transaction.
    ///
    /// Fails with [`Error::SchemaMismatch`] if the file was written by a newer build.
    pub fn initialize(conn: &mut Connection) -> Result<SchemaStatus> {
        let found = Self::current_version(conn)?;
        if found > SCHEMA_VERSION {
            return Err(Error::SchemaMismatch {
                found,
                expected: SCHEMA_VERSION,
            });
        }
        if found == SCHEMA_VERSION {
            tracing::debug!("Schema up to date at version {}", found);
            return Ok(SchemaStatus::UpToDate);
        }

        let tx = conn.transaction()?;
        for migration in MIGRATIONS.iter().filter(|m| m.version > found) {
            tracing::info!(
                "Applying schema migration {}: {}",
                migration.version,
                migration.description
            );
            for stmt in migration.statements {
                tx.execute(stmt, [])?;
            }
        }
        tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
        tx.commit()?;

        if found == 0 {
            Ok(SchemaStatus::Created)
        } else {
            Ok(SchemaStatus::Migrated {
                from: found,
                to: SCHEMA_VERSION,
            })
        }
    }
}
