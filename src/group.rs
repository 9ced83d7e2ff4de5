//! Groups - named logical buckets of devices

use serde::{Deserialize, Serialize};

/// Group identity, addressed on the network like a device
pub type GroupId = i32;

/// A logical group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupDevice {
    /// The group's own identifier
    pub device_id: GroupId,
    /// Display name
    pub name: String,
}

impl GroupDevice {
    pub fn new(device_id: GroupId, name: impl Into<String>) -> Self {
        Self {
            device_id,
            name: name.into(),
        }
    }
}
