//! Owner command handlers.

use std::sync::Arc;

use tabled::Tabled;

use lanboard_core::{Command as CoreCommand, CommandResult, Dashboard, Owner, OwnerDraft};

use crate::cli::{GlobalOpts, OwnersArgs, OwnersCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct OwnerRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Devices")]
    count: usize,
    #[tabled(rename = "Claimed")]
    devices: String,
}

impl From<&Arc<Owner>> for OwnerRow {
    fn from(o: &Arc<Owner>) -> Self {
        Self {
            id: o.id.to_string(),
            name: o.name.clone(),
            count: o.devices.len(),
            devices: o
                .devices
                .iter()
                .map(lanboard_core::Device::display_name)
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

fn detail(o: &Arc<Owner>) -> String {
    let mut lines = vec![
        format!("ID:       {}", o.id),
        format!("Name:     {}", o.name),
        format!("Devices:  {}", o.devices.len()),
    ];
    for device in &o.devices {
        lines.push(format!("  {:>6}  {}", device.id, device.display_name()));
    }
    lines.join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    dashboard: &Dashboard,
    args: OwnersArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        OwnersCommand::List => {
            let mut owners = dashboard.owners_snapshot().to_vec();
            owners.sort_by_key(|o| o.name.to_lowercase());
            let out = output::render_list(&global.output, &owners, |o| OwnerRow::from(o), |o| {
                o.id.to_string()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        OwnersCommand::Get { owner } => {
            let owner = util::resolve_owner(dashboard, &owner)?;
            print_owner(&owner, global)
        }

        OwnersCommand::Create { name, devices } => {
            let device_ids = util::resolve_device_ids(dashboard, &devices)?;
            let result = dashboard
                .execute(CoreCommand::CreateOwner(OwnerDraft::new(name, device_ids)))
                .await?;
            print_result(&result, global)
        }

        OwnersCommand::Update {
            owner,
            name,
            devices,
            add,
            remove,
        } => {
            let current = util::resolve_owner(dashboard, &owner)?;
            let mut draft = OwnerDraft::from_owner(&current);
            if let Some(name) = name {
                draft.name = name;
            }
            if !devices.is_empty() {
                draft.device_ids = util::resolve_device_ids(dashboard, &devices)?;
            }
            for id in util::resolve_device_ids(dashboard, &add)? {
                if !draft.device_ids.contains(&id) {
                    draft.device_ids.push(id);
                }
            }
            let released = util::resolve_device_ids(dashboard, &remove)?;
            draft.device_ids.retain(|id| !released.contains(id));

            let result = dashboard
                .execute(CoreCommand::UpdateOwner {
                    id: current.id,
                    draft,
                })
                .await?;
            print_result(&result, global)
        }

        OwnersCommand::Delete { owner } => {
            let owner = util::resolve_owner(dashboard, &owner)?;
            let prompt = format!(
                "Delete owner '{}'? Their {} device(s) become unassigned.",
                owner.name,
                owner.devices.len()
            );
            if !util::confirm("owners delete", &prompt, global.yes)? {
                return Ok(());
            }
            dashboard
                .execute(CoreCommand::DeleteOwner { id: owner.id })
                .await?;
            if !global.quiet {
                eprintln!("Deleted owner {}", owner.name);
            }
            Ok(())
        }
    }
}

fn print_owner(owner: &Arc<Owner>, global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_single(&global.output, owner, detail, |o| o.id.to_string())?;
    output::print_output(&out, global.quiet);
    Ok(())
}

fn print_result(result: &CommandResult, global: &GlobalOpts) -> Result<(), CliError> {
    match result {
        CommandResult::Owner(owner) => print_owner(owner, global),
        CommandResult::Device(_) | CommandResult::Deleted(_) => Ok(()),
    }
}
