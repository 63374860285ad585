//! Unknown-device listing: recently seen MACs no saved device claims.

use std::sync::Arc;

use chrono::Utc;
use tabled::Tabled;

use lanboard_core::{Dashboard, Mac};

use crate::cli::{GlobalOpts, UnknownArgs};
use crate::error::CliError;
use crate::output::{self, or_dash};

use super::devices::DeviceView;

#[derive(Tabled)]
pub(super) struct UnknownRow {
    #[tabled(rename = "MAC")]
    mac: String,
    #[tabled(rename = "Hostname")]
    hostname: String,
    #[tabled(rename = "Vendor")]
    vendor: String,
    #[tabled(rename = "IP")]
    ip: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Last Seen")]
    last_seen: String,
    #[tabled(rename = "Portal")]
    portal: String,
}

impl UnknownRow {
    pub(super) fn new(view: &DeviceView, color: bool) -> Self {
        let mac = view.device().primary_mac.as_ref();
        let status = view.status();
        Self {
            mac: view.primary_address(),
            hostname: or_dash(mac.and_then(Mac::hostname)),
            vendor: or_dash(mac.and_then(|m| m.vendor.as_deref())),
            ip: or_dash(view.device().ip()),
            status: output::presence_label(status.presence, color),
            last_seen: status.last_seen_label.clone(),
            portal: or_dash(status.portal_url.as_deref()),
        }
    }
}

pub fn handle(dashboard: &Dashboard, args: &UnknownArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let now = Utc::now();
    let rows = match args.days {
        Some(days) => dashboard.store().unknown_devices(now, days),
        None => dashboard.unknown_devices(now),
    };

    let views: Vec<DeviceView> = rows
        .into_iter()
        .map(|d| DeviceView::new(Arc::new(d), now))
        .collect();
    let color = output::should_color(&global.color);
    let out = output::render_list(
        &global.output,
        &views,
        |v| UnknownRow::new(v, color),
        DeviceView::primary_address,
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
