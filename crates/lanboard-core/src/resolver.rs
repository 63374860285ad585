// ── Owner ⇄ device consistency ──
//
// After a confirmed owner or device mutation, patch both stores so that
// every saved device's `owner` back-reference and every owner's `devices`
// list agree, without re-fetching either collection. Each pass touches a
// store at most once, so subscribers see one combined emission per store.
//
// Both directions are always resolved: a device save also updates the
// owner lists, and an owner save also updates the device back-references.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::model::{Device, EntityId, Owner, OwnerRef};
use crate::store::EntityStore;

/// A broken link between the two stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// The device points at an owner that is not in the owner store.
    UnknownOwner { device: EntityId, owner: EntityId },
    /// The device points at an owner whose list does not include it.
    NotListed { device: EntityId, owner: EntityId },
    /// The owner lists a device whose back-reference says otherwise.
    BackReferenceMismatch {
        device: EntityId,
        owner: EntityId,
        actual: Option<EntityId>,
    },
    /// Two owners list the same device.
    ClaimedTwice {
        device: EntityId,
        first: EntityId,
        second: EntityId,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownOwner { device, owner } => {
                write!(f, "device {device} references missing owner {owner}")
            }
            Self::NotListed { device, owner } => {
                write!(f, "device {device} references owner {owner}, which does not list it")
            }
            Self::BackReferenceMismatch {
                device,
                owner,
                actual: Some(actual),
            } => write!(f, "owner {owner} lists device {device}, which points at owner {actual}"),
            Self::BackReferenceMismatch {
                device,
                owner,
                actual: None,
            } => write!(f, "owner {owner} lists device {device}, which has no owner"),
            Self::ClaimedTwice {
                device,
                first,
                second,
            } => write!(f, "device {device} is listed by owners {first} and {second}"),
        }
    }
}

/// Cross-store patcher for the device and owner stores.
pub struct ConsistencyResolver<'a> {
    devices: &'a EntityStore<Device>,
    owners: &'a EntityStore<Owner>,
}

impl<'a> ConsistencyResolver<'a> {
    pub fn new(devices: &'a EntityStore<Device>, owners: &'a EntityStore<Owner>) -> Self {
        Self { devices, owners }
    }

    // ── Owner mutations ──────────────────────────────────────────────

    /// Apply an owner returned by a create or update.
    ///
    /// Listed devices get this owner as their back-reference and are merged
    /// into the device store. Devices that pointed here but are no longer
    /// listed lose their owner. Devices taken from another owner leave that
    /// owner's list.
    pub fn owner_saved(&self, owner: Owner) -> Arc<Owner> {
        let reference = owner.reference();
        let claimed: HashSet<EntityId> = owner.device_ids().collect();
        let devices_before = self.devices.snapshot();

        let listed: Vec<Device> = owner
            .devices
            .into_iter()
            .map(|mut device| {
                device.owner = Some(reference.clone());
                if device.macs.is_empty() {
                    // Owner payloads may embed devices without their MACs.
                    if let Some(stored) = devices_before.iter().find(|d| d.id == device.id) {
                        device.macs.clone_from(&stored.macs);
                        device.primary_mac.clone_from(&stored.primary_mac);
                    }
                }
                device
            })
            .collect();

        let released = devices_before
            .iter()
            .filter(|d| d.owner_id() == Some(reference.id) && !claimed.contains(&d.id))
            .map(|d| without_owner(d));

        let device_batch: Vec<Device> = listed.iter().cloned().chain(released).collect();
        let changed_devices = self.devices.merge_many(device_batch);

        let normalized = Owner {
            id: reference.id,
            name: reference.name.clone(),
            devices: listed,
        };
        let mut owner_batch: Vec<Owner> = self
            .owners
            .snapshot()
            .iter()
            .filter(|o| o.id != reference.id && o.device_ids().any(|id| claimed.contains(&id)))
            .map(|o| Owner {
                devices: o
                    .devices
                    .iter()
                    .filter(|d| !claimed.contains(&d.id))
                    .cloned()
                    .collect(),
                ..Owner::clone(o)
            })
            .collect();
        owner_batch.push(normalized.clone());
        let changed_owners = self.owners.merge_many(owner_batch);

        debug!(owner = %reference.id, changed_devices, changed_owners, "owner save resolved");
        self.owners.get(reference.id).unwrap_or_else(|| Arc::new(normalized))
    }

    /// Apply a confirmed owner delete: clear every back-reference to it in
    /// one device-store emission, then drop the owner.
    pub fn owner_deleted(&self, id: EntityId) {
        let released: Vec<Device> = self
            .devices
            .snapshot()
            .iter()
            .filter(|d| d.owner_id() == Some(id))
            .map(|d| without_owner(d))
            .collect();

        let changed_devices = self.devices.merge_many(released);
        self.owners.remove(id);

        debug!(owner = %id, changed_devices, "owner delete resolved");
    }

    // ── Device mutations ─────────────────────────────────────────────

    /// Apply a device returned by a create or update, and move it between
    /// owner lists to match its back-reference.
    pub fn device_saved(&self, mut device: Device) -> Arc<Device> {
        let owner_id = device.owner_id();

        // Keep the back-reference name in step with the owner store.
        if let Some(current) = owner_id.and_then(|id| self.owners.get(id)) {
            device.owner = Some(current.reference());
        }

        self.devices.merge(device.clone());

        let owner_batch: Vec<Owner> = self
            .owners
            .snapshot()
            .iter()
            .filter_map(|o| {
                let lists = o.owns(device.id);
                if Some(o.id) == owner_id {
                    let mut devices: Vec<Device> = o.devices.clone();
                    match devices.iter_mut().find(|d| d.id == device.id) {
                        Some(slot) => slot.clone_from(&device),
                        None => devices.push(device.clone()),
                    }
                    Some(Owner {
                        devices,
                        ..Owner::clone(o)
                    })
                } else if lists {
                    Some(Owner {
                        devices: o.devices.iter().filter(|d| d.id != device.id).cloned().collect(),
                        ..Owner::clone(o)
                    })
                } else {
                    None
                }
            })
            .collect();
        let changed_owners = self.owners.merge_many(owner_batch);

        debug!(device = %device.id, changed_owners, "device save resolved");
        self.devices.get(device.id).unwrap_or_else(|| Arc::new(device))
    }

    /// Apply a confirmed device delete: drop it and strike it from every
    /// owner's list.
    pub fn device_deleted(&self, id: EntityId) {
        self.devices.remove(id);

        let owner_batch: Vec<Owner> = self
            .owners
            .snapshot()
            .iter()
            .filter(|o| o.owns(id))
            .map(|o| Owner {
                devices: o.devices.iter().filter(|d| d.id != id).cloned().collect(),
                ..Owner::clone(o)
            })
            .collect();
        let changed_owners = self.owners.merge_many(owner_batch);

        debug!(device = %id, changed_owners, "device delete resolved");
    }

    // ── Audit ────────────────────────────────────────────────────────

    /// Every broken link between the stores; empty when consistent.
    pub fn violations(&self) -> Vec<Violation> {
        let devices = self.devices.snapshot();
        let owners = self.owners.snapshot();
        let mut found = Vec::new();

        for device in devices.iter().filter(|d| d.is_saved()) {
            let Some(owner_id) = device.owner_id() else {
                continue;
            };
            match owners.iter().find(|o| o.id == owner_id) {
                None => found.push(Violation::UnknownOwner {
                    device: device.id,
                    owner: owner_id,
                }),
                Some(owner) if !owner.owns(device.id) => found.push(Violation::NotListed {
                    device: device.id,
                    owner: owner_id,
                }),
                Some(_) => {}
            }
        }

        let mut listed_by: Vec<(EntityId, EntityId)> = Vec::new();
        for owner in owners.iter() {
            for device_id in owner.device_ids() {
                if let Some(&(_, first)) = listed_by.iter().find(|(d, _)| *d == device_id) {
                    found.push(Violation::ClaimedTwice {
                        device: device_id,
                        first,
                        second: owner.id,
                    });
                } else {
                    listed_by.push((device_id, owner.id));
                }

                if let Some(stored) = devices.iter().find(|d| d.id == device_id) {
                    let actual = stored.owner_id();
                    if actual != Some(owner.id) {
                        found.push(Violation::BackReferenceMismatch {
                            device: device_id,
                            owner: owner.id,
                            actual,
                        });
                    }
                }
            }
        }

        found
    }
}

fn without_owner(device: &Device) -> Device {
    Device {
        owner: None::<OwnerRef>,
        ..device.clone()
    }
}
