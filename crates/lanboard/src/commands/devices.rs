//! Device command handlers.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tabled::Tabled;

use lanboard_core::{
    Command as CoreCommand, CommandResult, Dashboard, Device, DeviceDraft, DeviceFilter,
    DeviceStatus, EntityId, Presence, sort_by_recency,
};

use crate::cli::{DeviceFields, DeviceListArgs, DevicesArgs, DevicesCommand, GlobalOpts};
use crate::error::CliError;
use crate::output::{self, or_dash};

use super::util;

// ── Views ───────────────────────────────────────────────────────────

/// A device plus what is derived from it at render time.
#[derive(Serialize)]
pub(super) struct DeviceView {
    #[serde(flatten)]
    device: Arc<Device>,
    display_name: String,
    status: DeviceStatus,
}

impl DeviceView {
    pub(super) fn new(device: Arc<Device>, now: DateTime<Utc>) -> Self {
        Self {
            display_name: device.display_name(),
            status: DeviceStatus::compute(&device, now),
            device,
        }
    }

    pub(super) fn id(&self) -> String {
        self.device.id.to_string()
    }

    pub(super) fn device(&self) -> &Device {
        &self.device
    }

    pub(super) fn status(&self) -> &DeviceStatus {
        &self.status
    }

    pub(super) fn primary_address(&self) -> String {
        self.device
            .primary_mac
            .as_ref()
            .map(|m| m.address.to_string())
            .unwrap_or_default()
    }
}

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
pub(super) struct DeviceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Owner")]
    owner: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Location")]
    location: String,
    #[tabled(rename = "IP")]
    ip: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Last Seen")]
    last_seen: String,
    #[tabled(rename = "Portal")]
    portal: String,
}

impl DeviceRow {
    pub(super) fn new(view: &DeviceView, color: bool) -> Self {
        let d = &view.device;
        Self {
            id: d.id.to_string(),
            name: view.display_name.clone(),
            owner: or_dash(d.owner.as_ref().map(|o| o.name.as_str())),
            category: or_dash(d.category.as_ref().map(|c| c.name.as_str())),
            location: or_dash(d.location.as_ref().map(|l| l.name.as_str())),
            ip: or_dash(d.ip()),
            status: output::presence_label(view.status.presence, color),
            last_seen: view.status.last_seen_label.clone(),
            portal: or_dash(view.status.portal_url.as_deref()),
        }
    }
}

fn detail(view: &DeviceView) -> String {
    let d = &view.device;
    let mut lines = vec![
        format!("ID:        {}", d.id),
        format!("Name:      {}", view.display_name),
        format!("Model:     {}", or_dash(d.model.as_deref())),
        format!(
            "Category:  {}",
            or_dash(d.category.as_ref().map(|c| c.name.as_str()))
        ),
        format!(
            "Location:  {}",
            or_dash(d.location.as_ref().map(|l| l.name.as_str()))
        ),
        format!(
            "Owner:     {}",
            or_dash(d.owner.as_ref().map(|o| o.name.as_str()))
        ),
        format!(
            "Status:    {} ({})",
            view.status.presence, view.status.last_seen_label
        ),
        format!("IP:        {}", or_dash(d.ip())),
        format!("Portal:    {}", or_dash(view.status.portal_url.as_deref())),
    ];

    if !d.macs.is_empty() {
        lines.push("MACs:".into());
        for mac in &d.macs {
            let primary = d.primary_mac.as_ref().is_some_and(|p| p.id == mac.id);
            lines.push(format!(
                "  {}{}  ip={}  host={}  vendor={}",
                mac.address,
                if primary { " *" } else { "" },
                or_dash(mac.last_ip.as_deref()),
                or_dash(mac.hostname()),
                or_dash(mac.vendor.as_deref()),
            ));
            for port in &mac.ports {
                lines.push(format!(
                    "    {}/{} {} {}",
                    port.number,
                    port.protocol.as_deref().unwrap_or("tcp"),
                    or_dash(port.service.as_deref()),
                    port.state.as_deref().unwrap_or(""),
                ));
            }
        }
    }
    lines.join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    dashboard: &Dashboard,
    args: DevicesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        DevicesCommand::List(list_args) => list(dashboard, &list_args, global),

        DevicesCommand::Get { device } => {
            let device = util::resolve_device(dashboard, &device)?;
            print_device(device, global)
        }

        DevicesCommand::Create(fields) => {
            let draft = DeviceDraft {
                name: fields.name,
                model: fields.model,
                category_id: fields.category.map(EntityId::new),
                location_id: fields.location.map(EntityId::new),
                owner_id: owner_id(dashboard, fields.owner.as_deref())?,
                mac_ids: util::resolve_mac_ids(dashboard, &fields.macs)?,
            };
            let result = dashboard.execute(CoreCommand::CreateDevice(draft)).await?;
            print_result(result, global)
        }

        DevicesCommand::Update {
            device,
            fields,
            clear_owner,
            clear_location,
        } => {
            let current = util::resolve_device(dashboard, &device)?;
            let mut draft = DeviceDraft::from_device(&current);
            apply_fields(dashboard, &mut draft, fields)?;
            if clear_owner {
                draft.owner_id = None;
            }
            if clear_location {
                draft.location_id = None;
            }

            let result = dashboard
                .execute(CoreCommand::UpdateDevice {
                    id: current.id,
                    draft,
                })
                .await?;
            print_result(result, global)
        }

        DevicesCommand::Delete { device } => {
            let device = util::resolve_device(dashboard, &device)?;
            let prompt = format!("Delete device '{}'?", device.display_name());
            if !util::confirm("devices delete", &prompt, global.yes)? {
                return Ok(());
            }
            dashboard
                .execute(CoreCommand::DeleteDevice { id: device.id })
                .await?;
            if !global.quiet {
                eprintln!("Deleted device {}", device.id);
            }
            Ok(())
        }
    }
}

fn list(dashboard: &Dashboard, args: &DeviceListArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let now = Utc::now();
    let filter = build_filter(dashboard, args, now)?;

    let mut devices: Vec<Arc<Device>> = dashboard
        .devices_snapshot()
        .iter()
        .filter(|d| filter.matches(d))
        .cloned()
        .collect();
    sort_by_recency(&mut devices);

    let views: Vec<DeviceView> = devices
        .into_iter()
        .map(|d| DeviceView::new(d, now))
        .collect();
    let color = output::should_color(&global.color);
    let out = output::render_list(
        &global.output,
        &views,
        |v| DeviceRow::new(v, color),
        DeviceView::id,
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

fn build_filter(
    dashboard: &Dashboard,
    args: &DeviceListArgs,
    now: DateTime<Utc>,
) -> Result<DeviceFilter, CliError> {
    let mut filters = Vec::new();

    // Values within one flag are alternatives; separate flags narrow.
    let owners = args
        .owner
        .iter()
        .map(|o| util::resolve_owner(dashboard, o).map(|o| DeviceFilter::ByOwner(o.id)))
        .collect::<Result<Vec<_>, _>>()?;
    let locations = args
        .location
        .iter()
        .map(|&id| DeviceFilter::ByLocation(EntityId::new(id)))
        .collect();
    let categories = args
        .category
        .iter()
        .map(|&id| DeviceFilter::ByCategory(EntityId::new(id)))
        .collect();
    for group in [owners, locations, categories] {
        if !group.is_empty() {
            filters.push(DeviceFilter::AnyOf(group));
        }
    }

    if args.unassigned {
        filters.push(DeviceFilter::Unassigned);
    }
    if let Some(raw) = args.presence.as_deref() {
        let presence: Presence = raw.parse().map_err(|_| CliError::Validation {
            field: "presence".into(),
            reason: format!("expected online, away or offline, got '{raw}'"),
        })?;
        filters.push(DeviceFilter::ByPresence { presence, now });
    }
    Ok(DeviceFilter::AllOf(filters))
}

fn owner_id(dashboard: &Dashboard, owner: Option<&str>) -> Result<Option<EntityId>, CliError> {
    owner
        .map(|o| util::resolve_owner(dashboard, o).map(|o| o.id))
        .transpose()
}

/// Overlay the flags that were given onto an existing draft.
fn apply_fields(
    dashboard: &Dashboard,
    draft: &mut DeviceDraft,
    fields: DeviceFields,
) -> Result<(), CliError> {
    if let Some(name) = fields.name {
        draft.name = Some(name);
    }
    if let Some(model) = fields.model {
        draft.model = Some(model);
    }
    if let Some(category) = fields.category {
        draft.category_id = Some(EntityId::new(category));
    }
    if let Some(location) = fields.location {
        draft.location_id = Some(EntityId::new(location));
    }
    if let Some(owner) = owner_id(dashboard, fields.owner.as_deref())? {
        draft.owner_id = Some(owner);
    }
    if !fields.macs.is_empty() {
        draft.mac_ids = util::resolve_mac_ids(dashboard, &fields.macs)?;
    }
    Ok(())
}

fn print_device(device: Arc<Device>, global: &GlobalOpts) -> Result<(), CliError> {
    let view = DeviceView::new(device, Utc::now());
    let out = output::render_single(&global.output, &view, detail, DeviceView::id)?;
    output::print_output(&out, global.quiet);
    Ok(())
}

fn print_result(result: CommandResult, global: &GlobalOpts) -> Result<(), CliError> {
    match result {
        CommandResult::Device(device) => print_device(device, global),
        CommandResult::Owner(_) | CommandResult::Deleted(_) => Ok(()),
    }
}
