//! Settings persistence

use rusqlite::{OptionalExtension, params};

use super::Database;
use crate::setting::Setting;
use crate::{Error, Result};

const SELECT_SETTINGS: &str =
    "SELECT id, key, next_device_index, next_group_index, auth_required, ttl FROM settings";

/// Access to the settings relation
pub struct SettingsStore<'a> {
    db: &'a Database,
}

impl<'a> SettingsStore<'a> {
    pub(crate) fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Save a setting.
    ///
    /// A setting with an id replaces the row with that id; one without is
    /// inserted and comes back carrying the generated id.
    pub fn save(&self, setting: &Setting) -> Result<Setting> {
        let id = self.db.with_connection(|conn| {
            let written = match setting.id {
                Some(id) => conn.execute(
                    r#"
                    INSERT OR REPLACE INTO settings (id, key, next_device_index, next_group_index, auth_required, ttl)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                    "#,
                    params![
                        id,
                        setting.network_key,
                        setting.last_device_index,
                        setting.last_group_index,
                        setting.auth_required,
                        setting.ttl,
                    ],
                )?,
                None => conn.execute(
                    r#"
                    INSERT INTO settings (key, next_device_index, next_group_index, auth_required, ttl)
                    VALUES (?1, ?2, ?3, ?4, ?5)
                    "#,
                    params![
                        setting.network_key,
                        setting.last_device_index,
                        setting.last_group_index,
                        setting.auth_required,
                        setting.ttl,
                    ],
                )?,
            };

            if written == 0 {
                tracing::warn!("Saving settings {:?} wrote no row", setting.id);
                return Err(Error::InvalidRowId("settings"));
            }
            Ok(conn.last_insert_rowid())
        })?;

        tracing::debug!("Saved settings {}", id);
        Ok(Setting {
            id: Some(id),
            ..setting.clone()
        })
    }

    /// Get a setting by id
    pub fn get(&self, id: i64) -> Result<Option<Setting>> {
        self.db.with_connection(|conn| {
            let setting = conn
                .query_row(&format!("{SELECT_SETTINGS} WHERE id = ?1"), [id], row_to_setting)
                .optional()?;
            Ok(setting)
        })
    }

    /// All settings rows in id order
    pub fn list_all(&self) -> Result<Vec<Setting>> {
        self.db.with_connection(|conn| {
            let mut stmt = conn.prepare(&format!("{SELECT_SETTINGS} ORDER BY id"))?;
            let settings = stmt
                .query_map([], row_to_setting)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(settings)
        })
    }

    /// Count settings rows
    pub fn count(&self) -> Result<usize> {
        super::count_rows(self.db, "settings")
    }
}

fn row_to_setting(row: &rusqlite::Row) -> rusqlite::Result<Setting> {
    Ok(Setting {
        id: Some(row.get(0)?),
        network_key: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        last_device_index: row.get::<_, Option<i32>>(2)?.unwrap_or_default(),
        last_group_index: row.get::<_, Option<i32>>(3)?.unwrap_or_default(),
        auth_required: row.get::<_, Option<bool>>(4)?.unwrap_or_default(),
        ttl: row.get::<_, Option<i32>>(5)?.unwrap_or_default(),
    })
}
