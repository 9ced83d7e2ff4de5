//! Group persistence

use rusqlite::params;

use super::Database;
use crate::group::{GroupDevice, GroupId};
use crate::{Error, Result};

/// Access to the groups relation
pub struct GroupStore<'a> {
    db: &'a Database,
}

impl<'a> GroupStore<'a> {
    pub(crate) fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// All groups in scan order
    pub fn list_all(&self) -> Result<Vec<GroupDevice>> {
        self.db.with_connection(|conn| {
            let mut stmt = conn.prepare("SELECT id, name FROM \"groups\" ORDER BY rowid")?;
            let groups = stmt
                .query_map([], row_to_group)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(groups)
        })
    }

    /// Insert or replace a group, stamping the owning settings id
    pub fn upsert(&self, group: &GroupDevice, settings_id: i64) -> Result<GroupDevice> {
        let row_id = self.db.with_connection(|conn| {
            let written = conn.execute(
                "INSERT OR REPLACE INTO \"groups\" (id, name, settings_id) VALUES (?1, ?2, ?3)",
                params![group.device_id, group.name, settings_id],
            )?;
            if written == 0 {
                tracing::warn!("Upserting group {} wrote no row", group.device_id);
                return Err(Error::InvalidRowId("groups"));
            }
            Ok(conn.last_insert_rowid())
        })?;

        let device_id = GroupId::try_from(row_id).map_err(|_| Error::InvalidRowId("groups"))?;
        tracing::debug!("Upserted group {} ({})", device_id, group.name);
        Ok(GroupDevice {
            device_id,
            name: group.name.clone(),
        })
    }

    /// Rename a group; unknown ids are ignored
    pub fn update_name(&self, id: GroupId, name: &str) -> Result<()> {
        let updated = self.db.with_connection(|conn| {
            Ok(conn.execute(
                "UPDATE \"groups\" SET name = ?1 WHERE id = ?2",
                params![name, id],
            )?)
        })?;
        tracing::debug!("Renamed group {} ({} rows)", id, updated);
        Ok(())
    }

    /// Delete a group row. Membership rows referencing it are left in place.
    pub fn remove(&self, id: GroupId) -> Result<()> {
        let removed = self
            .db
            .with_connection(|conn| Ok(conn.execute("DELETE FROM \"groups\" WHERE id = ?1", [id])?))?;
        tracing::debug!("Removed group {} ({} rows)", id, removed);
        Ok(())
    }

    /// Count groups
    pub fn count(&self) -> Result<usize> {
        super::count_rows(self.db, "\"groups\"")
    }
}

fn row_to_group(row: &rusqlite::Row) -> rusqlite::Result<GroupDevice> {
    Ok(GroupDevice {
        device_id: row.get(0)?,
        name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MeshStore;

    #[test]
    fn test_upsert_twice_keeps_latest() {
        let store = MeshStore::open_in_memory().unwrap();
        let groups = store.groups();

        let created = groups.upsert(&GroupDevice::new(3, "Kitchen"), 1).unwrap();
        assert_eq!(created, GroupDevice::new(3, "Kitchen"));
        groups.upsert(&GroupDevice::new(3, "Living room"), 1).unwrap();

        assert_eq!(groups.list_all().unwrap(), vec![GroupDevice::new(3, "Living room")]);
    }

    #[test]
    fn test_list_all_returns_every_group() {
        let store = MeshStore::open_in_memory().unwrap();
        let groups = store.groups();
        for (id, name) in [(1, "a"), (2, "b"), (3, "c")] {
            groups.upsert(&GroupDevice::new(id, name), 1).unwrap();
        }

        let ids: Vec<_> = groups.list_all().unwrap().iter().map(|g| g.device_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_update_name() {
        let store = MeshStore::open_in_memory().unwrap();
        let groups = store.groups();
        groups.upsert(&GroupDevice::new(1, "old"), 1).unwrap();

        groups.update_name(1, "new").unwrap();
        groups.update_name(99, "ghost").unwrap();

        assert_eq!(groups.list_all().unwrap(), vec![GroupDevice::new(1, "new")]);
    }

    #[test]
    fn test_remove_leaves_memberships() {
        let store = MeshStore::open_in_memory().unwrap();
        store.groups().upsert(&GroupDevice::new(1, "g"), 1).unwrap();
        store.membership().add(10, 1).unwrap();

        store.groups().remove(1).unwrap();

        assert!(store.groups().list_all().unwrap().is_empty());
        assert_eq!(store.membership().list_device_ids_for_group(1).unwrap().len(), 1);
    }
}
