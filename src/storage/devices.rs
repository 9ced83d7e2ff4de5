//! Device persistence
//!
//! Devices are loaded together with their membership in a single join and
//! written together with it in a single transaction.

use rusqlite::{Connection, Params, params};

use super::{Database, membership};
use crate::device::{DeviceId, SingleDevice};
use crate::group::GroupId;
use crate::{Error, Result};

const SELECT_DEVICES_WITH_GROUPS: &str = r#"
SELECT d.id, d.name, d.hash, d.modelsupport_low, d.modelsupport_high, d.groups_supported, m.group_id
FROM devices d
LEFT JOIN models m ON m.device_id = d.id
"#;

/// Access to the devices relation
pub struct DeviceStore<'a> {
    db: &'a Database,
}

impl<'a> DeviceStore<'a> {
    pub(crate) fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// All devices in scan order, each with its membership set attached
    pub fn list_all(&self) -> Result<Vec<SingleDevice>> {
        self.db.with_connection(|conn| load_devices(conn, "", []))
    }

    /// Get a device with its membership by id
    pub fn get(&self, id: DeviceId) -> Result<Option<SingleDevice>> {
        self.db.with_connection(|conn| {
            let mut devices = load_devices(conn, "WHERE d.id = ?1", [id])?;
            Ok(devices.pop())
        })
    }

    /// Insert or replace a device and resynchronize its membership.
    ///
    /// The row write, the removal of the old membership and the insertion of
    /// `device.group_membership` commit together or not at all.
    pub fn upsert(&self, device: &SingleDevice, settings_id: i64) -> Result<()> {
        self.db.with_transaction(|tx| {
            let written = tx.execute(
                r#"
                INSERT OR REPLACE INTO devices (id, name, hash, modelsupport_low, modelsupport_high, groups_supported, settings_id)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
                params![
                    device.device_id,
                    device.name,
                    device.uuid_hash,
                    device.model_support_low as i64,
                    device.model_support_high as i64,
                    device.minimum_supported_groups,
                    settings_id,
                ],
            )?;
            if written == 0 {
                tracing::warn!("Upserting device {} wrote no row", device.device_id);
                return Err(Error::InvalidRowId("devices"));
            }

            let removed = membership::delete_for_device(tx, device.device_id)?;
            for group_id in &device.group_membership {
                membership::insert(tx, device.device_id, *group_id)?;
            }

            tracing::debug!(
                "Upserted device {} ({}): replaced {} memberships with {:?}",
                device.device_id,
                device.name,
                removed,
                device.group_membership
            );
            Ok(())
        })
    }

    /// Rename a device; unknown ids are ignored
    pub fn update_name(&self, id: DeviceId, name: &str) -> Result<()> {
        let updated = self.db.with_connection(|conn| {
            Ok(conn.execute("UPDATE devices SET name = ?1 WHERE id = ?2", params![name, id])?)
        })?;
        tracing::debug!("Renamed device {} ({} rows)", id, updated);
        Ok(())
    }

    /// Delete a device row. Its membership rows are left in place.
    pub fn remove(&self, id: DeviceId) -> Result<()> {
        let removed = self
            .db
            .with_connection(|conn| Ok(conn.execute("DELETE FROM devices WHERE id = ?1", [id])?))?;
        tracing::debug!("Removed device {} ({} rows)", id, removed);
        Ok(())
    }

    /// Count devices
    pub fn count(&self) -> Result<usize> {
        super::count_rows(self.db, "devices")
    }
}

/// Run the device/membership join and fold rows into devices.
/// Rows of one device are contiguous because the scan is ordered by device rowid.
fn load_devices<P: Params>(conn: &Connection, filter: &str, params: P) -> Result<Vec<SingleDevice>> {
    let sql = format!("{SELECT_DEVICES_WITH_GROUPS} {filter} ORDER BY d.rowid");
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params)?;

    let mut devices: Vec<SingleDevice> = Vec::new();
    while let Some(row) = rows.next()? {
        let device_id: DeviceId = row.get(0)?;
        if !matches!(devices.last(), Some(last) if last.device_id == device_id) {
            devices.push(row_to_device(row)?);
        }

        let group_id: Option<GroupId> = row.get(6)?;
        if let (Some(group_id), Some(device)) = (group_id, devices.last_mut()) {
            device.group_membership.insert(group_id);
        }
    }

    Ok(devices)
}

fn row_to_device(row: &rusqlite::Row) -> rusqlite::Result<SingleDevice> {
    // Bitmap halves are stored as i64; reinterpret the bits
    let low: i64 = row.get::<_, Option<i64>>(3)?.unwrap_or_default();
    let high: i64 = row.get::<_, Option<i64>>(4)?.unwrap_or_default();

    let device = SingleDevice::new(
        row.get(0)?,
        row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        row.get::<_, Option<i32>>(2)?.unwrap_or_default(),
        low as u64,
        high as u64,
    )
    .with_minimum_supported_groups(row.get::<_, Option<i32>>(5)?.unwrap_or_default());

    Ok(device)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MeshStore;
    use std::collections::BTreeSet;

    fn light(id: DeviceId, name: &str, groups: &[GroupId]) -> SingleDevice {
        SingleDevice::new(id, name, 0x1234, 0b11, 0).with_groups(groups.iter().copied())
    }

    fn membership_of(store: &MeshStore, id: DeviceId) -> BTreeSet<GroupId> {
        store
            .devices()
            .list_all()
            .unwrap()
            .into_iter()
            .find(|d| d.device_id == id)
            .unwrap()
            .group_membership
    }

    #[test]
    fn test_upsert_then_list_all_attaches_membership() {
        let store = MeshStore::open_in_memory().unwrap();
        store.devices().upsert(&light(10, "Light1", &[1, 2]), 1).unwrap();

        let devices = store.devices().list_all().unwrap();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].name, "Light1");
        assert_eq!(devices[0].group_membership, BTreeSet::from([1, 2]));
    }

    #[test]
    fn test_reupsert_replaces_membership_exactly() {
        let store = MeshStore::open_in_memory().unwrap();
        store.devices().upsert(&light(10, "Light1", &[1, 2]), 1).unwrap();
        store.devices().upsert(&light(10, "Light1", &[2]), 1).unwrap();

        assert_eq!(membership_of(&store, 10), BTreeSet::from([2]));
        assert_eq!(store.devices().count().unwrap(), 1);

        store.devices().upsert(&light(10, "Light1", &[]), 1).unwrap();
        assert!(membership_of(&store, 10).is_empty());
    }

    #[test]
    fn test_upsert_twice_keeps_latest_fields() {
        let store = MeshStore::open_in_memory().unwrap();
        store.devices().upsert(&light(10, "before", &[1]), 1).unwrap();
        let updated = light(10, "after", &[1]).with_minimum_supported_groups(4);
        store.devices().upsert(&updated, 2).unwrap();

        assert_eq!(store.devices().get(10).unwrap(), Some(updated));
    }

    #[test]
    fn test_remove_drops_device_but_keeps_memberships() {
        let store = MeshStore::open_in_memory().unwrap();
        store.devices().upsert(&light(10, "Light1", &[1, 2]), 1).unwrap();
        store.devices().upsert(&light(11, "Light2", &[1]), 1).unwrap();

        store.devices().remove(10).unwrap();

        let ids: Vec<_> = store.devices().list_all().unwrap().iter().map(|d| d.device_id).collect();
        assert_eq!(ids, vec![11]);
        assert_eq!(
            store.membership().list_group_ids_for_device(10).unwrap(),
            BTreeSet::from([1, 2])
        );
    }

    #[test]
    fn test_failure_mid_resync_keeps_previous_membership() {
        let store = MeshStore::open_in_memory().unwrap();
        store.devices().upsert(&light(10, "Light1", &[1, 2]), 1).unwrap();
        store
            .database()
            .with_connection(|conn| {
                conn.execute_batch(
                    "CREATE TRIGGER fail_group_99 BEFORE INSERT ON models WHEN NEW.group_id = 99
                     BEGIN SELECT RAISE(ABORT, 'simulated failure'); END;",
                )?;
                Ok(())
            })
            .unwrap();

        let result = store.devices().upsert(&light(10, "Renamed", &[3, 99]), 1);

        assert!(matches!(result, Err(Error::ConstraintViolation(_))));
        let device = store.devices().get(10).unwrap().unwrap();
        assert_eq!(device.name, "Light1");
        assert_eq!(device.group_membership, BTreeSet::from([1, 2]));
    }

    #[test]
    fn test_ignored_row_write_leaves_membership_untouched() {
        let store = MeshStore::open_in_memory().unwrap();
        store.membership().add(7, 3).unwrap();
        store
            .database()
            .with_connection(|conn| {
                conn.execute_batch(
                    "CREATE TRIGGER skip_device_7 BEFORE INSERT ON devices WHEN NEW.id = 7
                     BEGIN SELECT RAISE(IGNORE); END;",
                )?;
                Ok(())
            })
            .unwrap();

        let result = store.devices().upsert(&light(7, "Ghost", &[4]), 1);

        assert!(matches!(result, Err(Error::InvalidRowId("devices"))));
        assert_eq!(
            store.membership().list_group_ids_for_device(7).unwrap(),
            BTreeSet::from([3])
        );
    }

    #[test]
    fn test_bitmap_high_bits_round_trip() {
        let store = MeshStore::open_in_memory().unwrap();
        let device = SingleDevice::new(1, "bits", -5, u64::MAX, 1 << 63);
        store.devices().upsert(&device, 1).unwrap();

        let loaded = store.devices().get(1).unwrap().unwrap();
        assert_eq!(loaded.model_support_low, u64::MAX);
        assert_eq!(loaded.model_support_high, 1 << 63);
        assert_eq!(loaded.uuid_hash, -5);
        assert!(loaded.supports_model(127));
    }

    #[test]
    fn test_update_name_has_no_membership_side_effects() {
        let store = MeshStore::open_in_memory().unwrap();
        store.devices().upsert(&light(10, "Light1", &[1, 2]), 1).unwrap();

        store.devices().update_name(10, "Porch").unwrap();
        store.devices().update_name(404, "nobody").unwrap();

        let device = store.devices().get(10).unwrap().unwrap();
        assert_eq!(device.name, "Porch");
        assert_eq!(device.group_membership, BTreeSet::from([1, 2]));
        assert_eq!(store.devices().count().unwrap(), 1);
    }

    #[test]
    fn test_join_matches_per_device_lookup() {
        let store = MeshStore::open_in_memory().unwrap();
        store.devices().upsert(&light(1, "a", &[1, 2, 3]), 1).unwrap();
        store.devices().upsert(&light(2, "b", &[]), 1).unwrap();
        store.devices().upsert(&light(3, "c", &[2]), 1).unwrap();
        store.membership().add(99, 1).unwrap();

        for device in store.devices().list_all().unwrap() {
            let per_device = store
                .membership()
                .list_group_ids_for_device(device.device_id)
                .unwrap();
            assert_eq!(device.group_membership, per_device);
        }
        assert_eq!(store.devices().list_all().unwrap().len(), 3);
    }

    #[test]
    fn test_get_missing_is_none() {
        let store = MeshStore::open_in_memory().unwrap();
        assert!(store.devices().get(1).unwrap().is_none());
    }
}
