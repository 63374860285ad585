// ── Runtime dashboard configuration ──
//
// Describes how to reach the backend and how often to poll. Never touches
// disk: the CLI (via lanboard-config) builds a `DashboardConfig` and hands
// it in.

use std::time::Duration;

use url::Url;

/// Connection and polling settings for one [`Dashboard`](crate::Dashboard).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    /// Backend base URL (e.g. `http://192.168.1.10:8000`). The `/api/`
    /// suffix is added if missing.
    pub api_url: Url,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Polling period while live. Zero disables the scheduler.
    pub refresh_interval: Duration,
    /// Start in live mode.
    pub live_mode: bool,
    /// Push channel path relative to the backend root (e.g. `/ws`).
    /// `None` disables the push bridge.
    pub push_path: Option<String>,
    /// Unknown-device rows only include MACs seen within this many days.
    /// Zero shows every unclaimed MAC.
    pub unknown_window_days: u32,
}

impl DashboardConfig {
    pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
    pub const DEFAULT_UNKNOWN_WINDOW_DAYS: u32 = 7;

    /// Defaults for everything but the URL.
    pub fn new(api_url: Url) -> Self {
        Self {
            api_url,
            timeout: Self::DEFAULT_TIMEOUT,
            refresh_interval: Self::DEFAULT_REFRESH_INTERVAL,
            live_mode: true,
            push_path: None,
            unknown_window_days: Self::DEFAULT_UNKNOWN_WINDOW_DAYS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_poll_every_minute_live() {
        let url = Url::parse("http://10.0.0.2:8000").unwrap_or_else(|e| panic!("{e}"));
        let config = DashboardConfig::new(url);

        assert_eq!(config.refresh_interval, Duration::from_secs(60));
        assert!(config.live_mode);
        assert!(config.push_path.is_none());
        assert_eq!(config.unknown_window_days, 7);
    }
}
