//! Devices - individually addressable nodes of the mesh
//!
//! A device carries a 128-bit model support bitmap split into two 64-bit
//! halves, matching how it is persisted. Group membership is derived from
//! the membership table and attached when devices are loaded.

use crate::group::GroupId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Network-assigned device identity (e.g. a short address)
pub type DeviceId = i32;

/// A single controllable node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleDevice {
    /// Externally assigned identity, unique per device
    pub device_id: DeviceId,
    /// Display name
    pub name: String,
    /// Fingerprint of the device UUID
    pub uuid_hash: i32,
    /// Model support bits 0..64
    pub model_support_low: u64,
    /// Model support bits 64..128
    pub model_support_high: u64,
    /// Number of groups the device can hold at minimum
    pub minimum_supported_groups: i32,
    /// Groups this device currently belongs to
    #[serde(default)]
    pub group_membership: BTreeSet<GroupId>,
}

impl SingleDevice {
    pub fn new(
        device_id: DeviceId,
        name: impl Into<String>,
        uuid_hash: i32,
        model_support_low: u64,
        model_support_high: u64,
    ) -> Self {
        Self {
            device_id,
            name: name.into(),
            uuid_hash,
            model_support_low,
            model_support_high,
            minimum_supported_groups: 0,
            group_membership: BTreeSet::new(),
        }
    }

    /// Replace the membership set
    pub fn with_groups(mut self, groups: impl IntoIterator<Item = GroupId>) -> Self {
        self.group_membership = groups.into_iter().collect();
        self
    }

    pub fn with_minimum_supported_groups(mut self, count: i32) -> Self {
        self.minimum_supported_groups = count;
        self
    }

    /// The full 128-bit model support bitmap
    pub fn model_support(&self) -> u128 {
        (u128::from(self.model_support_high) << 64) | u128::from(self.model_support_low)
    }

    /// Check whether the device advertises support for model number `model`
    pub fn supports_model(&self, model: u32) -> bool {
        model < 128 && self.model_support() & (1u128 << model) != 0
    }

    pub fn is_member_of(&self, group_id: GroupId) -> bool {
        self.group_membership.contains(&group_id)
    }
}
