// ── Filter predicates for device snapshots ──
//
// Used by consumers to narrow a snapshot without re-querying the backend.

use chrono::{DateTime, Utc};

use crate::model::{Device, EntityId};
use crate::status::{DeviceStatus, Presence};

/// Filter predicate for device collections.
pub enum DeviceFilter {
    ByOwner(EntityId),
    ByLocation(EntityId),
    ByCategory(EntityId),
    /// Saved devices nobody has claimed.
    Unassigned,
    ByPresence {
        presence: Presence,
        now: DateTime<Utc>,
    },
    AllOf(Vec<DeviceFilter>),
    /// Matches when any inner filter does. Empty matches nothing.
    AnyOf(Vec<DeviceFilter>),
}

impl DeviceFilter {
    pub fn matches(&self, device: &Device) -> bool {
        match self {
            Self::ByOwner(id) => device.owner_id() == Some(*id),
            Self::ByLocation(id) => device.location.as_ref().is_some_and(|l| l.id == *id),
            Self::ByCategory(id) => device.category.as_ref().is_some_and(|c| c.id == *id),
            Self::Unassigned => device.is_saved() && device.owner.is_none(),
            Self::ByPresence { presence, now } => {
                DeviceStatus::compute(device, *now).presence == *presence
            }
            Self::AllOf(filters) => filters.iter().all(|f| f.matches(device)),
            Self::AnyOf(filters) => filters.iter().any(|f| f.matches(device)),
        }
    }
}
