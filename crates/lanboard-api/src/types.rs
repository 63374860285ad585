// Wire types for the inventory REST API.
//
// Field names follow the backend's snake_case JSON exactly. Anything the
// backend may omit (owner-embedded devices only carry summary MACs) has a
// serde default so partial payloads still decode.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Lookups ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryResponse {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationResponse {
    pub id: u64,
    pub name: String,
}

// ── Network identity ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortResponse {
    #[serde(default)]
    pub id: u64,
    #[serde(alias = "number")]
    pub port: u16,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub banner: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

/// Service announcement picked up by the scanner (mDNS, SSDP, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryResponse {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub device_name: Option<String>,
    #[serde(default)]
    pub device_type: Option<String>,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacResponse {
    pub id: u64,
    pub address: String,
    #[serde(default)]
    pub last_ip: Option<String>,
    #[serde(default, deserialize_with = "timestamp::deserialize")]
    pub last_seen: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ping_time_ms: Option<f64>,
    #[serde(default)]
    pub arp_time_ms: Option<f64>,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub os_guess: Option<String>,
    #[serde(default)]
    pub ttl: Option<u32>,
    #[serde(default)]
    pub ports: Option<Vec<PortResponse>>,
    #[serde(default)]
    pub discoveries: Option<Vec<DiscoveryResponse>>,
}

// ── Devices & owners ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerSummary {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceResponse {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub category: Option<CategoryResponse>,
    #[serde(default)]
    pub location: Option<LocationResponse>,
    #[serde(default)]
    pub owner: Option<OwnerSummary>,
    #[serde(default)]
    pub macs: Vec<MacResponse>,
    #[serde(default)]
    pub primary_mac: Option<MacResponse>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnerResponse {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub devices: Vec<DeviceResponse>,
}

// ── Request bodies ───────────────────────────────────────────────────

/// Body for `POST /api/devices` and `PUT /api/devices/{id}`.
///
/// Absent optionals serialize as explicit `null`; the backend treats a
/// missing key and `null` differently on update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRequest {
    pub name: Option<String>,
    pub model: Option<String>,
    pub category_id: Option<u64>,
    pub location_id: Option<u64>,
    pub owner_id: Option<u64>,
    pub mac_ids: Vec<u64>,
}

/// Body for `POST /api/owners` and `PUT /api/owners/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerRequest {
    pub name: String,
    pub device_ids: Vec<u64>,
}

// ── Timestamp decoding ───────────────────────────────────────────────

/// Lenient `last_seen` decoding: RFC 3339 with offset, or a naive
/// ISO-8601 datetime which the backend emits in UTC.
mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer};

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        let Some(raw) = raw.filter(|s| !s.trim().is_empty()) else {
            return Ok(None);
        };
        parse(&raw).map(Some).map_err(serde::de::Error::custom)
    }

    pub(super) fn parse(raw: &str) -> Result<DateTime<Utc>, String> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Ok(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
            .map(|naive| naive.and_utc())
            .map_err(|e| format!("invalid timestamp {raw:?}: {e}"))
    }
}
