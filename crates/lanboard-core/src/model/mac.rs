// ── Network identity domain types ──

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::entity_id::{EntityId, MacAddress};

/// An open port observed on a MAC's last known IP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Port {
    pub id: EntityId,
    pub number: u16,
    pub protocol: Option<String>,
    pub service: Option<String>,
    pub banner: Option<String>,
    pub state: Option<String>,
}

/// A service announcement (mDNS, SSDP, ...) attributed to a MAC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Discovery {
    pub id: EntityId,
    pub protocol: Option<String>,
    pub device_name: Option<String>,
    pub device_type: Option<String>,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
}

/// A hardware address as last seen by the scanner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mac {
    pub id: EntityId,
    pub address: MacAddress,
    pub last_ip: Option<String>,
    pub last_seen: Option<DateTime<Utc>>,
    pub hostname: Option<String>,
    pub vendor: Option<String>,
    pub os_guess: Option<String>,
    pub ttl: Option<u32>,
    pub ping_time_ms: Option<f64>,
    pub arp_time_ms: Option<f64>,
    pub ports: Vec<Port>,
    pub discoveries: Vec<Discovery>,
}

impl Mac {
    /// Bare record carrying only identity; everything observed is empty.
    pub fn new(id: EntityId, address: MacAddress) -> Self {
        Self {
            id,
            address,
            last_ip: None,
            last_seen: None,
            hostname: None,
            vendor: None,
            os_guess: None,
            ttl: None,
            ping_time_ms: None,
            arp_time_ms: None,
            ports: Vec::new(),
            discoveries: Vec::new(),
        }
    }

    /// Hostname if the scanner resolved a non-blank one.
    pub fn hostname(&self) -> Option<&str> {
        self.hostname.as_deref().map(str::trim).filter(|h| !h.is_empty())
    }
}
