use tabled::{settings::Style, Table, Tabled};

use crate::{GroupDevice, Setting, SingleDevice};

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "Id")]
    id: i32,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "UUID hash")]
    uuid_hash: String,
    #[tabled(rename = "Models")]
    models: String,
    #[tabled(rename = "Min groups")]
    minimum_supported_groups: i32,
    #[tabled(rename = "Groups")]
    groups: String,
}

#[derive(Tabled)]
struct GroupRow {
    #[tabled(rename = "Id")]
    id: i32,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Members")]
    members: String,
}

pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn add_row(&mut self, label: &str, value: &str) {
        self.rows.push(TableRow {
            metric: label.to_string(),
            value: value.to_string(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }

        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn join_ids<'a>(ids: impl IntoIterator<Item = &'a i32>) -> String {
    ids.into_iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn stats_table(stats: &[(&str, String)]) -> String {
    let mut builder = TableBuilder::new();
    for (label, value) in stats {
        builder.add_row(label, value);
    }
    builder.build()
}

pub fn setting_table(setting: &Setting) -> String {
    let mut builder = TableBuilder::new();
    let id = setting.id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string());
    builder.add_row("Id", &id);
    builder.add_row("Network key", &setting.network_key);
    builder.add_row("Next device index", &setting.last_device_index.to_string());
    builder.add_row("Next group index", &setting.last_group_index.to_string());
    builder.add_row("Auth required", &setting.auth_required.to_string());
    builder.add_row("TTL", &setting.ttl.to_string());
    builder.build()
}

pub fn device_table(devices: &[SingleDevice]) -> String {
    let rows: Vec<DeviceRow> = devices
        .iter()
        .map(|d| DeviceRow {
            id: d.device_id,
            name: d.name.clone(),
            uuid_hash: format!("{:#010x}", d.uuid_hash),
            models: format!("{:#034x}", d.model_support()),
            minimum_supported_groups: d.minimum_supported_groups,
            groups: join_ids(&d.group_membership),
        })
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Groups with the device ids that belong to each
pub fn group_table(groups: &[(GroupDevice, Vec<i32>)]) -> String {
    let rows: Vec<GroupRow> = groups
        .iter()
        .map(|(g, members)| GroupRow {
            id: g.device_id,
            name: g.name.clone(),
            members: join_ids(members),
        })
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_table_lists_groups() {
        let devices = vec![SingleDevice::new(10, "Light1", 0x1f, 1, 0).with_groups([2, 1])];
        let table = device_table(&devices);
        assert!(table.contains("Light1"));
        assert!(table.contains("1, 2"));
        assert!(table.contains("0x0000001f"));
    }

    #[test]
    fn test_empty_builder_renders_nothing() {
        assert!(TableBuilder::new().build().is_empty());
    }

    #[test]
    fn test_setting_table_shows_fields() {
        let table = setting_table(&Setting::new("abc").with_ttl(4));
        assert!(table.contains("Network key"));
        assert!(table.contains("abc"));
    }
}
