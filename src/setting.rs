//! Network settings - the shared configuration of one mesh network

use serde::{Deserialize, Serialize};

/// Network-wide configuration record.
///
/// `id` is `None` until the record has been saved; saving assigns the
/// generated id and later saves with that id replace the same row.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Setting {
    /// Row id, assigned by storage on first save
    pub id: Option<i64>,
    /// Shared network credential (opaque)
    pub network_key: String,
    /// Next device index to hand out
    pub last_device_index: i32,
    /// Next group index to hand out
    pub last_group_index: i32,
    /// Whether devices must authenticate when associating
    pub auth_required: bool,
    /// Hop count for outgoing messages
    pub ttl: i32,
}

impl Setting {
    /// Create an unsaved setting for the given network key
    pub fn new(network_key: impl Into<String>) -> Self {
        Self {
            network_key: network_key.into(),
            ..Self::default()
        }
    }

    pub fn with_ttl(mut self, ttl: i32) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_auth_required(mut self, auth_required: bool) -> Self {
        self.auth_required = auth_required;
        self
    }

    pub fn with_indices(mut self, last_device_index: i32, last_group_index: i32) -> Self {
        self.last_device_index = last_device_index;
        self.last_group_index = last_group_index;
        self
    }

    /// Whether this record has been assigned a row id
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}
