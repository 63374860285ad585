// ── Derived, time-relative device state ──
//
// Pure functions of a device's primary MAC and the current time. Nothing
// here is cached: callers recompute on every render so "Online" decays to
// "Away" without a store emission.

use std::net::IpAddr;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use strum::{Display, EnumString};

use crate::model::{Device, Port};

const ONLINE_WITHIN_MINUTES: i64 = 5;
const AWAY_WITHIN_MINUTES: i64 = 10;

const HTTP_PORTS: [u16; 4] = [80, 443, 8080, 8443];
const HTTPS_PORTS: [u16; 2] = [443, 8443];

// ── Presence ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Presence {
    Online,
    Away,
    Offline,
}

/// Bucket time since last sighting: under 5 minutes is online, under 10
/// is away, anything older (or never seen) is offline.
///
/// A timestamp slightly in the future (clock skew) counts as online.
pub fn presence_bucket(elapsed: Option<TimeDelta>) -> Presence {
    match elapsed {
        None => Presence::Offline,
        Some(e) if e < TimeDelta::minutes(ONLINE_WITHIN_MINUTES) => Presence::Online,
        Some(e) if e < TimeDelta::minutes(AWAY_WITHIN_MINUTES) => Presence::Away,
        Some(_) => Presence::Offline,
    }
}

// ── Last seen ────────────────────────────────────────────────────────

/// "Just now", "{n}m ago", "{n}h ago", "{n}d ago", or "Never seen".
/// Units are floored.
pub fn last_seen_label(elapsed: Option<TimeDelta>) -> String {
    let Some(elapsed) = elapsed else {
        return "Never seen".to_owned();
    };

    let minutes = elapsed.num_minutes();
    if minutes < 1 {
        "Just now".to_owned()
    } else if minutes < 60 {
        format!("{minutes}m ago")
    } else if minutes < 60 * 24 {
        format!("{}h ago", minutes / 60)
    } else {
        format!("{}d ago", minutes / (60 * 24))
    }
}

// ── Portal URL ───────────────────────────────────────────────────────

fn service_contains(port: &Port, needle: &str) -> bool {
    port.service
        .as_deref()
        .is_some_and(|s| s.to_lowercase().contains(needle))
}

fn is_http(port: &Port) -> bool {
    HTTP_PORTS.contains(&port.number) || service_contains(port, "http")
}

fn is_https(port: &Port) -> bool {
    HTTPS_PORTS.contains(&port.number) || service_contains(port, "https")
}

/// Pick the best web port among `ports` and build a URL on `ip`.
///
/// Plain HTTP beats HTTPS whatever the numbers; then 80, then 443, then
/// the lowest port. The port suffix is left off for a scheme's default.
pub fn portal_url_for<'a>(ip: &str, ports: impl IntoIterator<Item = &'a Port>) -> Option<String> {
    let ip = ip.trim();
    if ip.is_empty() {
        return None;
    }

    let (port, https) = ports
        .into_iter()
        .filter(|p| is_http(p))
        .map(|p| (p.number, is_https(p)))
        .min_by_key(|&(number, https)| (https, number != 80, number != 443, number))?;

    let scheme = if https { "https" } else { "http" };
    let host = match ip.parse::<IpAddr>() {
        Ok(IpAddr::V6(v6)) => format!("[{v6}]"),
        _ => ip.to_owned(),
    };
    let is_default = (port == 80 && !https) || (port == 443 && https);

    Some(if is_default {
        format!("{scheme}://{host}")
    } else {
        format!("{scheme}://{host}:{port}")
    })
}

/// Portal URL for a device: ports from every MAC, address from the
/// primary MAC's last IP.
pub fn portal_url(device: &Device) -> Option<String> {
    let ip = device.ip()?;
    portal_url_for(ip, device.macs.iter().flat_map(|m| m.ports.iter()))
}

// ── Bundle ───────────────────────────────────────────────────────────

/// Everything a row or card shows about a device's liveness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceStatus {
    pub presence: Presence,
    pub last_seen: Option<DateTime<Utc>>,
    pub last_seen_label: String,
    pub portal_url: Option<String>,
}

impl DeviceStatus {
    pub fn compute(device: &Device, now: DateTime<Utc>) -> Self {
        let last_seen = device.primary_mac.as_ref().and_then(|m| m.last_seen);
        let elapsed = last_seen.map(|seen| now - seen);

        Self {
            presence: presence_bucket(elapsed),
            last_seen,
            last_seen_label: last_seen_label(elapsed),
            portal_url: portal_url(device),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{EntityId, Mac, MacAddress};
    use chrono::TimeZone;

    fn port(number: u16, service: Option<&str>) -> Port {
        Port {
            id: EntityId::new(u64::from(number)),
            number,
            protocol: Some("tcp".into()),
            service: service.map(str::to_owned),
            banner: None,
            state: Some("open".into()),
        }
    }

    fn secs(s: i64) -> Option<TimeDelta> {
        Some(TimeDelta::seconds(s))
    }

    // ── Presence ─────────────────────────────────────────────────────

    #[test]
    fn presence_boundaries() {
        assert_eq!(presence_bucket(secs(0)), Presence::Online);
        assert_eq!(presence_bucket(secs(4 * 60 + 59)), Presence::Online);
        assert_eq!(presence_bucket(secs(5 * 60)), Presence::Away);
        assert_eq!(presence_bucket(secs(9 * 60 + 59)), Presence::Away);
        assert_eq!(presence_bucket(secs(10 * 60)), Presence::Offline);
        assert_eq!(presence_bucket(None), Presence::Offline);
    }

    #[test]
    fn presence_is_monotonic_in_elapsed() {
        let mut previous = Presence::Online;
        for s in (0..=30 * 60).step_by(15) {
            let current = presence_bucket(secs(s));
            assert!(current >= previous, "regressed at {s}s");
            previous = current;
        }
    }

    #[test]
    fn future_timestamp_counts_as_online() {
        assert_eq!(presence_bucket(secs(-30)), Presence::Online);
    }

    #[test]
    fn presence_parses_from_cli_text() {
        assert_eq!("Away".parse::<Presence>().unwrap(), Presence::Away);
        assert_eq!(Presence::Offline.to_string(), "offline");
    }

    // ── Labels ───────────────────────────────────────────────────────

    #[test]
    fn last_seen_labels() {
        assert_eq!(last_seen_label(None), "Never seen");
        assert_eq!(last_seen_label(secs(30)), "Just now");
        assert_eq!(last_seen_label(secs(59 * 60 + 59)), "59m ago");
        assert_eq!(last_seen_label(secs(125 * 60)), "2h ago");
        assert_eq!(last_seen_label(secs(2900 * 60)), "2d ago");
    }

    // ── Portal URL ───────────────────────────────────────────────────

    #[test]
    fn plain_http_beats_https_regardless_of_number() {
        let ports = [port(8080, Some("http-alt")), port(443, Some("https"))];
        assert_eq!(
            portal_url_for("10.0.0.5", &ports).as_deref(),
            Some("http://10.0.0.5:8080")
        );
    }

    #[test]
    fn default_http_port_has_no_suffix() {
        let ports = [port(80, None), port(443, None)];
        assert_eq!(portal_url_for("10.0.0.5", &ports).as_deref(), Some("http://10.0.0.5"));
    }

    #[test]
    fn https_only_device() {
        let ports = [port(8443, None), port(443, None)];
        assert_eq!(portal_url_for("10.0.0.5", &ports).as_deref(), Some("https://10.0.0.5"));

        let ports = [port(8443, None)];
        assert_eq!(
            portal_url_for("10.0.0.5", &ports).as_deref(),
            Some("https://10.0.0.5:8443")
        );
    }

    #[test]
    fn service_label_qualifies_odd_ports() {
        let ports = [port(9000, Some("HTTP")), port(5000, Some("upnp"))];
        assert_eq!(
            portal_url_for("10.0.0.5", &ports).as_deref(),
            Some("http://10.0.0.5:9000")
        );
    }

    #[test]
    fn lowest_plain_port_wins_after_80() {
        let ports = [port(9090, Some("http")), port(8080, None), port(8000, Some("http"))];
        assert_eq!(
            portal_url_for("10.0.0.5", &ports).as_deref(),
            Some("http://10.0.0.5:8000")
        );
    }

    #[test]
    fn no_web_port_means_no_url() {
        let ports = [port(22, Some("ssh")), port(445, Some("microsoft-ds"))];
        assert!(portal_url_for("10.0.0.5", &ports).is_none());
        assert!(portal_url_for("10.0.0.5", &[]).is_none());
    }

    #[test]
    fn ipv6_host_is_bracketed() {
        let ports = [port(8080, None)];
        assert_eq!(
            portal_url_for("fe80::1", &ports).as_deref(),
            Some("http://[fe80::1]:8080")
        );
    }

    // ── Device bundle ────────────────────────────────────────────────

    fn device_seen(seen: Option<DateTime<Utc>>, ip: Option<&str>) -> Device {
        let mut primary = Mac::new(EntityId::new(1), MacAddress::new("aa:bb:cc:dd:ee:01"));
        primary.last_seen = seen;
        primary.last_ip = ip.map(str::to_owned);

        let mut secondary = Mac::new(EntityId::new(2), MacAddress::new("aa:bb:cc:dd:ee:02"));
        secondary.ports = vec![port(80, Some("http"))];

        Device {
            id: EntityId::new(5),
            name: None,
            model: None,
            category: None,
            location: None,
            owner: None,
            macs: vec![primary.clone(), secondary],
            primary_mac: Some(primary),
        }
    }

    #[test]
    fn device_status_uses_ports_from_every_mac() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let device = device_seen(Some(now - TimeDelta::minutes(7)), Some("10.0.0.9"));

        let status = DeviceStatus::compute(&device, now);

        assert_eq!(status.presence, Presence::Away);
        assert_eq!(status.last_seen_label, "7m ago");
        assert_eq!(status.portal_url.as_deref(), Some("http://10.0.0.9"));
    }

    #[test]
    fn never_seen_device_without_ip() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let status = DeviceStatus::compute(&device_seen(None, None), now);

        assert_eq!(status.presence, Presence::Offline);
        assert_eq!(status.last_seen_label, "Never seen");
        assert!(status.portal_url.is_none());
    }
}
