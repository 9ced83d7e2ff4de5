//! SQLite storage facade

use std::path::Path;

use super::schema;
use super::{Database, DeviceStore, GroupStore, MembershipStore, SettingsStore};
use crate::Result;

/// SQLite-backed storage for the mesh network topology
#[derive(Debug)]
pub struct MeshStore {
    db: Database,
}

impl MeshStore {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self {
            db: Database::open(path)?,
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            db: Database::open_in_memory()?,
        })
    }

    /// The underlying connection manager
    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn settings(&self) -> SettingsStore<'_> {
        SettingsStore::new(&self.db)
    }

    pub fn groups(&self) -> GroupStore<'_> {
        GroupStore::new(&self.db)
    }

    pub fn devices(&self) -> DeviceStore<'_> {
        DeviceStore::new(&self.db)
    }

    pub fn membership(&self) -> MembershipStore<'_> {
        MembershipStore::new(&self.db)
    }

    // ========== Maintenance ==========

    /// Delete all rows from every table (factory reset)
    pub fn wipe_all(&self) -> Result<()> {
        let removed = self.db.with_transaction(|tx| {
            let mut removed = 0;
            for table in schema::ALL_TABLES {
                removed += tx.execute(&format!("DELETE FROM {table}"), [])?;
            }
            Ok(removed)
        })?;
        tracing::info!("Wiped mesh database ({} rows removed)", removed);
        Ok(())
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<DbStats> {
        let (memberships_without_device, memberships_without_group) =
            self.db.with_connection(|conn| {
                let without_device: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM models m WHERE NOT EXISTS (SELECT 1 FROM devices d WHERE d.id = m.device_id)",
                    [],
                    |row| row.get(0),
                )?;
                let without_group: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM models m WHERE NOT EXISTS (SELECT 1 FROM \"groups\" g WHERE g.id = m.group_id)",
                    [],
                    |row| row.get(0),
                )?;
                Ok((without_device as usize, without_group as usize))
            })?;

        Ok(DbStats {
            settings: self.settings().count()?,
            devices: self.devices().count()?,
            groups: self.groups().count()?,
            memberships: self.membership().count()?,
            memberships_without_device,
            memberships_without_group,
        })
    }
}

/// Database statistics
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DbStats {
    pub settings: usize,
    pub devices: usize,
    pub groups: usize,
    pub memberships: usize,
    /// Membership rows whose device row is missing
    pub memberships_without_device: usize,
    /// Membership rows whose group row is missing
    pub memberships_without_group: usize,
}

impl DbStats {
    /// Membership rows left behind by a removed device or group
    pub fn has_orphans(&self) -> bool {
        self.memberships_without_device > 0 || self.memberships_without_group > 0
    }

    /// Label/value pairs in display order
    pub fn rows(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Settings", self.settings.to_string()),
            ("Devices", self.devices.to_string()),
            ("Groups", self.groups.to_string()),
            ("Memberships", self.memberships.to_string()),
            ("Memberships without device", self.memberships_without_device.to_string()),
            ("Memberships without group", self.memberships_without_group.to_string()),
        ]
    }
}

impl std::fmt::Display for DbStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Database Statistics:")?;
        for (label, value) in self.rows() {
            writeln!(f, "  {}: {}", label, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GroupDevice, Setting, SingleDevice};

    fn seeded_store() -> (MeshStore, i64) {
        let store = MeshStore::open_in_memory().unwrap();
        let settings_id = store.settings().save(&Setting::new("abc").with_ttl(4)).unwrap().id.unwrap();
        store.groups().upsert(&GroupDevice::new(1, "Kitchen"), settings_id).unwrap();
        store.groups().upsert(&GroupDevice::new(2, "Hall"), settings_id).unwrap();
        store
            .devices()
            .upsert(&SingleDevice::new(10, "Light1", 1, 1, 0).with_groups([1, 2]), settings_id)
            .unwrap();
        (store, settings_id)
    }

    #[test]
    fn test_wipe_all_empties_every_table() {
        let (store, settings_id) = seeded_store();

        store.wipe_all().unwrap();

        assert!(store.devices().list_all().unwrap().is_empty());
        assert!(store.groups().list_all().unwrap().is_empty());
        assert!(store.settings().get(settings_id).unwrap().is_none());
        assert_eq!(store.membership().count().unwrap(), 0);
    }

    #[test]
    fn test_store_usable_after_wipe() {
        let (store, _) = seeded_store();
        store.wipe_all().unwrap();

        let saved = store.settings().save(&Setting::new("fresh")).unwrap();
        assert_eq!(store.settings().get(saved.id.unwrap()).unwrap(), Some(saved));
    }

    #[test]
    fn test_stats_counts_orphans_of_removed_devices() {
        let (store, _) = seeded_store();
        store.devices().remove(10).unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.settings, 1);
        assert_eq!(stats.devices, 0);
        assert_eq!(stats.groups, 2);
        assert_eq!(stats.memberships, 2);
        assert_eq!(stats.memberships_without_device, 2);
        assert_eq!(stats.memberships_without_group, 0);
        assert!(stats.has_orphans());
        assert!(stats.to_string().contains("Memberships without device: 2"));
    }

    #[test]
    fn test_stats_counts_orphans_of_removed_groups() {
        let (store, _) = seeded_store();
        assert!(!store.stats().unwrap().has_orphans());

        store.groups().remove(2).unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.memberships_without_device, 0);
        assert_eq!(stats.memberships_without_group, 1);
        assert!(stats.has_orphans());
    }

    #[test]
    fn test_failed_wipe_keeps_every_table() {
        let (store, settings_id) = seeded_store();
        let before = store.stats().unwrap();
        store
            .database()
            .with_connection(|conn| {
                conn.execute_batch(
                    "CREATE TRIGGER keep_models BEFORE DELETE ON models
                     BEGIN SELECT RAISE(ABORT, 'simulated failure'); END;",
                )?;
                Ok(())
            })
            .unwrap();

        let result = store.wipe_all();

        assert!(matches!(result, Err(crate::Error::ConstraintViolation(_))));
        assert_eq!(store.stats().unwrap(), before);
        assert!(store.settings().get(settings_id).unwrap().is_some());
        assert_eq!(store.devices().list_all().unwrap().len(), 1);
        assert_eq!(store.groups().list_all().unwrap().len(), 2);
    }

    #[test]
    fn test_open_file_backed_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mesh.db");
        {
            let store = MeshStore::open(&path).unwrap();
            store
                .devices()
                .upsert(&SingleDevice::new(10, "Light1", 0, 0, 0).with_groups([1]), 1)
                .unwrap();
        }

        let store = MeshStore::open(&path).unwrap();
        let devices = store.devices().list_all().unwrap();
        assert_eq!(devices.len(), 1);
        assert!(devices[0].is_member_of(1));
    }
}
