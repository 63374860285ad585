// ── Device domain types ──

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::entity_id::EntityId;
use super::lookup::{Category, Location};
use super::mac::Mac;

const UNKNOWN_DEVICE_NAME: &str = "Unknown Device";

/// Back-reference from a device to the owner that claims it.
///
/// Carries only identity and display name; the owner's device list lives
/// in the owner store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OwnerRef {
    pub id: EntityId,
    pub name: String,
}

/// A physical device, identified by one or more MAC addresses.
///
/// `primary_mac`, when present, is always one of `macs`. Conversion from
/// the wire restores that invariant if the backend payload breaks it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Device {
    pub id: EntityId,
    pub name: Option<String>,
    pub model: Option<String>,
    pub category: Option<Category>,
    pub location: Option<Location>,
    pub owner: Option<OwnerRef>,
    pub macs: Vec<Mac>,
    pub primary_mac: Option<Mac>,
}

impl Device {
    /// Synthesize an unsaved device for a MAC no saved device claims.
    pub fn from_unknown_mac(mac: Mac) -> Self {
        Self {
            id: EntityId::UNSAVED,
            name: Some(mac.address.to_string()),
            model: None,
            category: None,
            location: None,
            owner: None,
            macs: vec![mac.clone()],
            primary_mac: Some(mac),
        }
    }

    pub fn is_saved(&self) -> bool {
        self.id.is_saved()
    }

    pub fn owner_id(&self) -> Option<EntityId> {
        self.owner.as_ref().map(|o| o.id)
    }

    /// Last IP of the primary MAC.
    pub fn ip(&self) -> Option<&str> {
        self.primary_mac.as_ref().and_then(|m| m.last_ip.as_deref())
    }

    /// Most recent sighting across every MAC the device owns.
    pub fn latest_seen(&self) -> Option<DateTime<Utc>> {
        self.macs.iter().filter_map(|m| m.last_seen).max()
    }

    /// Name shown to the user.
    ///
    /// An explicit name wins. Otherwise the name is composed from owner,
    /// location and category ("Alice's Office Laptop"). Without a category
    /// there is nothing to compose, so the primary MAC's hostname, then its
    /// address, then a fixed placeholder stand in.
    pub fn display_name(&self) -> String {
        if let Some(name) = self.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            return name.to_owned();
        }

        if let Some(category) = &self.category {
            let mut composed = String::new();
            if let Some(owner) = &self.owner {
                composed.push_str(&owner.name);
                composed.push_str("'s ");
            }
            if let Some(location) = &self.location {
                composed.push_str(&location.name);
                composed.push(' ');
            }
            composed.push_str(&category.name);
            return composed.trim().to_owned();
        }

        match &self.primary_mac {
            Some(mac) => mac
                .hostname()
                .map_or_else(|| mac.address.to_string(), str::to_owned),
            None => UNKNOWN_DEVICE_NAME.to_owned(),
        }
    }

    fn first_hostname(&self) -> &str {
        self.macs.first().and_then(Mac::hostname).unwrap_or("")
    }
}

/// Most recently seen first; never-seen devices last; ties by the first
/// MAC's hostname.
pub fn sort_by_recency<D: AsRef<Device>>(devices: &mut [D]) {
    devices.sort_by(|a, b| {
        let (a, b) = (a.as_ref(), b.as_ref());
        match (a.latest_seen(), b.latest_seen()) {
            (Some(x), Some(y)) => y.cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
        .then_with(|| a.first_hostname().cmp(b.first_hostname()))
    });
}

impl AsRef<Device> for Device {
    fn as_ref(&self) -> &Device {
        self
    }
}
