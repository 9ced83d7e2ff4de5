//! Storage Layer - SQLite-backed persistence
//!
//! System of record is SQLite with tables:
//! - settings(id, key, next_device_index, next_group_index, auth_required, ttl)
//! - devices(id, name, hash, modelsupport_low, modelsupport_high, groups_supported, settings_id)
//! - groups(id, name, settings_id)
//! - models(device_id, group_id)

pub mod connection;
pub mod devices;
pub mod groups;
pub mod membership;
pub mod schema;
pub mod settings;
pub mod sqlite;

pub use connection::Database;
pub use devices::DeviceStore;
pub use groups::GroupStore;
pub use membership::MembershipStore;
pub use schema::{SCHEMA_VERSION, SchemaManager, SchemaStatus};
pub use settings::SettingsStore;
pub use sqlite::{DbStats, MeshStore};

use crate::Result;

/// Count the rows of `table`
pub(crate) fn count_rows(db: &Database, table: &str) -> Result<usize> {
    db.with_connection(|conn| {
        let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
        Ok(count as usize)
    })
}
