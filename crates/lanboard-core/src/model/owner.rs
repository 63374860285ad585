// ── Owner domain type ──

use serde::Serialize;

use super::device::{Device, OwnerRef};
use super::entity_id::EntityId;

/// A person (or group) that claims devices.
///
/// Every device in `devices` carries an `owner` back-reference to this
/// owner once it has passed through conversion or the resolver.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Owner {
    pub id: EntityId,
    pub name: String,
    pub devices: Vec<Device>,
}

impl Owner {
    pub fn device_ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.devices.iter().map(|d| d.id)
    }

    pub fn owns(&self, device_id: EntityId) -> bool {
        self.devices.iter().any(|d| d.id == device_id)
    }

    /// The back-reference a claimed device should hold.
    pub fn reference(&self) -> OwnerRef {
        OwnerRef {
            id: self.id,
            name: self.name.clone(),
        }
    }
}

impl From<&Owner> for OwnerRef {
    fn from(owner: &Owner) -> Self {
        owner.reference()
    }
}
