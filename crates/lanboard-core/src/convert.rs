// ── API-to-domain type conversions ──
//
// Bridges raw `lanboard_api` response types into `lanboard_core::model`
// domain types. Each `From` impl fills defaults for missing optional data
// and restores the invariants the store relies on.

use lanboard_api::types::{
    CategoryResponse, DeviceResponse, DiscoveryResponse, LocationResponse, MacResponse,
    OwnerResponse, OwnerSummary, PortResponse,
};

use crate::model::{
    Category, Device, Discovery, EntityId, Location, Mac, MacAddress, Owner, OwnerRef, Port,
};

// ── Lookups ────────────────────────────────────────────────────────

impl From<CategoryResponse> for Category {
    fn from(c: CategoryResponse) -> Self {
        Self {
            id: EntityId::new(c.id),
            name: c.name,
        }
    }
}

impl From<LocationResponse> for Location {
    fn from(l: LocationResponse) -> Self {
        Self {
            id: EntityId::new(l.id),
            name: l.name,
        }
    }
}

// ── Network identity ───────────────────────────────────────────────

impl From<PortResponse> for Port {
    fn from(p: PortResponse) -> Self {
        Self {
            id: EntityId::new(p.id),
            number: p.port,
            protocol: p.protocol,
            service: p.service,
            banner: p.banner,
            state: p.state,
        }
    }
}

impl From<DiscoveryResponse> for Discovery {
    fn from(d: DiscoveryResponse) -> Self {
        Self {
            id: EntityId::new(d.id),
            protocol: d.protocol,
            device_name: d.device_name,
            device_type: d.device_type,
            manufacturer: d.manufacturer,
            model: d.model,
        }
    }
}

impl From<MacResponse> for Mac {
    fn from(m: MacResponse) -> Self {
        Self {
            id: EntityId::new(m.id),
            address: MacAddress::new(&m.address),
            last_ip: m.last_ip.filter(|ip| !ip.trim().is_empty()),
            last_seen: m.last_seen,
            hostname: m.hostname,
            vendor: m.vendor,
            os_guess: m.os_guess,
            ttl: m.ttl,
            ping_time_ms: m.ping_time_ms,
            arp_time_ms: m.arp_time_ms,
            ports: m.ports.unwrap_or_default().into_iter().map(Port::from).collect(),
            discoveries: m
                .discoveries
                .unwrap_or_default()
                .into_iter()
                .map(Discovery::from)
                .collect(),
        }
    }
}

// ── Devices & owners ───────────────────────────────────────────────

impl From<OwnerSummary> for OwnerRef {
    fn from(o: OwnerSummary) -> Self {
        Self {
            id: EntityId::new(o.id),
            name: o.name,
        }
    }
}

impl From<DeviceResponse> for Device {
    fn from(d: DeviceResponse) -> Self {
        let mut macs: Vec<Mac> = d.macs.into_iter().map(Mac::from).collect();

        // The primary MAC must be one of `macs`. Prefer the richer copy from
        // the list when both are present; adopt a stray primary into it.
        let primary_mac = match d.primary_mac.map(Mac::from) {
            Some(primary) => match macs.iter().find(|m| m.id == primary.id) {
                Some(listed) => Some(listed.clone()),
                None => {
                    macs.insert(0, primary.clone());
                    Some(primary)
                }
            },
            None => macs.first().cloned(),
        };

        Self {
            id: EntityId::new(d.id),
            name: d.name.filter(|n| !n.trim().is_empty()),
            model: d.model.filter(|m| !m.trim().is_empty()),
            category: d.category.map(Category::from),
            location: d.location.map(Location::from),
            owner: d.owner.map(OwnerRef::from),
            macs,
            primary_mac,
        }
    }
}

impl From<OwnerResponse> for Owner {
    /// Embedded devices are back-linked to the owner that carries them,
    /// whatever their own payload said.
    fn from(o: OwnerResponse) -> Self {
        let reference = OwnerRef {
            id: EntityId::new(o.id),
            name: o.name.clone(),
        };

        let devices = o
            .devices
            .into_iter()
            .map(|d| {
                let mut device = Device::from(d);
                device.owner = Some(reference.clone());
                device
            })
            .collect();

        Self {
            id: reference.id,
            name: o.name,
            devices,
        }
    }
}
