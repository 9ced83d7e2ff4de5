//! Device ↔ group membership (the `models` junction table)
//!
//! Rows are only written as a side effect of a device upsert, so the
//! connection-level functions here are shared with [`super::devices`] to run
//! inside its transaction.

use std::collections::BTreeSet;

use rusqlite::{Connection, params};

use super::Database;
use crate::Result;
use crate::device::DeviceId;
use crate::group::GroupId;

pub(crate) fn delete_for_device(conn: &Connection, device_id: DeviceId) -> Result<usize> {
    let removed = conn.execute("DELETE FROM models WHERE device_id = ?1", [device_id])?;
    Ok(removed)
}

pub(crate) fn insert(conn: &Connection, device_id: DeviceId, group_id: GroupId) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO models (device_id, group_id) VALUES (?1, ?2)",
        params![device_id, group_id],
    )?;
    Ok(())
}

pub(crate) fn group_ids_for_device(conn: &Connection, device_id: DeviceId) -> Result<BTreeSet<GroupId>> {
    let mut stmt = conn.prepare_cached("SELECT group_id FROM models WHERE device_id = ?1")?;
    let ids = stmt
        .query_map([device_id], |row| row.get(0))?
        .collect::<rusqlite::Result<BTreeSet<GroupId>>>()?;
    Ok(ids)
}

/// Access to the membership relation
pub struct MembershipStore<'a> {
    db: &'a Database,
}

impl<'a> MembershipStore<'a> {
    pub(crate) fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Delete every membership row of a device
    pub fn remove_all_for_device(&self, device_id: DeviceId) -> Result<()> {
        let removed = self.db.with_connection(|conn| delete_for_device(conn, device_id))?;
        tracing::debug!("Removed {} memberships of device {}", removed, device_id);
        Ok(())
    }

    /// Insert or replace a single membership row
    pub fn add(&self, device_id: DeviceId, group_id: GroupId) -> Result<()> {
        self.db.with_connection(|conn| insert(conn, device_id, group_id))
    }

    /// Group ids the device currently belongs to
    pub fn list_group_ids_for_device(&self, device_id: DeviceId) -> Result<BTreeSet<GroupId>> {
        self.db.with_connection(|conn| group_ids_for_device(conn, device_id))
    }

    /// Device ids that belong to a group
    pub fn list_device_ids_for_group(&self, group_id: GroupId) -> Result<BTreeSet<DeviceId>> {
        self.db.with_connection(|conn| {
            let mut stmt = conn.prepare_cached("SELECT device_id FROM models WHERE group_id = ?1")?;
            let ids = stmt
                .query_map([group_id], |row| row.get(0))?
                .collect::<rusqlite::Result<BTreeSet<DeviceId>>>()?;
            Ok(ids)
        })
    }

    /// Count all membership rows
    pub fn count(&self) -> Result<usize> {
        super::count_rows(self.db, "models")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MeshStore;

    #[test]
    fn test_add_same_pair_twice_keeps_one_row() {
        let store = MeshStore::open_in_memory().unwrap();
        let membership = store.membership();

        membership.add(10, 1).unwrap();
        membership.add(10, 1).unwrap();
        membership.add(10, 2).unwrap();

        assert_eq!(membership.count().unwrap(), 2);
        assert_eq!(
            membership.list_group_ids_for_device(10).unwrap(),
            BTreeSet::from([1, 2])
        );
    }

    #[test]
    fn test_remove_all_for_device_only_touches_that_device() {
        let store = MeshStore::open_in_memory().unwrap();
        let membership = store.membership();

        membership.add(10, 1).unwrap();
        membership.add(10, 2).unwrap();
        membership.add(11, 1).unwrap();
        membership.remove_all_for_device(10).unwrap();

        assert!(membership.list_group_ids_for_device(10).unwrap().is_empty());
        assert_eq!(membership.list_device_ids_for_group(1).unwrap(), BTreeSet::from([11]));
    }

    #[test]
    fn test_unknown_device_has_no_groups() {
        let store = MeshStore::open_in_memory().unwrap();
        assert!(store.membership().list_group_ids_for_device(404).unwrap().is_empty());
    }
}
