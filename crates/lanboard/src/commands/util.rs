//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::sync::Arc;

use lanboard_core::{Dashboard, Device, EntityId, MacAddress, Owner};

use crate::error::CliError;

/// Resolve a device identifier (ID or MAC address) via snapshot lookup.
pub fn resolve_device(dashboard: &Dashboard, identifier: &str) -> Result<Arc<Device>, CliError> {
    let snap = dashboard.devices_snapshot();
    let found = match identifier.parse::<EntityId>() {
        Ok(id) => snap.iter().find(|d| d.id == id),
        Err(_) => {
            let mac = MacAddress::new(identifier);
            snap.iter().find(|d| d.macs.iter().any(|m| m.address == mac))
        }
    };
    found
        .cloned()
        .ok_or_else(|| CliError::not_found("device", identifier))
}

/// Resolve an owner identifier (ID or exact name, case-insensitive).
pub fn resolve_owner(dashboard: &Dashboard, identifier: &str) -> Result<Arc<Owner>, CliError> {
    let snap = dashboard.owners_snapshot();
    let found = match identifier.parse::<EntityId>() {
        Ok(id) => snap.iter().find(|o| o.id == id),
        Err(_) => {
            let wanted = identifier.trim().to_lowercase();
            snap.iter().find(|o| o.name.to_lowercase() == wanted)
        }
    };
    found
        .cloned()
        .ok_or_else(|| CliError::not_found("owner", identifier))
}

/// Resolve MAC identifiers (record ID or address) to MAC record IDs.
pub fn resolve_mac_ids(dashboard: &Dashboard, identifiers: &[String]) -> Result<Vec<EntityId>, CliError> {
    let snap = dashboard.macs_snapshot();
    identifiers
        .iter()
        .map(|identifier| {
            let found = match identifier.parse::<EntityId>() {
                Ok(id) => snap.iter().find(|m| m.id == id),
                Err(_) => {
                    let address = MacAddress::new(identifier);
                    snap.iter().find(|m| m.address == address)
                }
            };
            found
                .map(|m| m.id)
                .ok_or_else(|| CliError::not_found("mac", identifier))
        })
        .collect()
}

/// Resolve device identifiers to IDs, keeping order and dropping repeats.
pub fn resolve_device_ids(
    dashboard: &Dashboard,
    identifiers: &[String],
) -> Result<Vec<EntityId>, CliError> {
    let mut ids = Vec::with_capacity(identifiers.len());
    for identifier in identifiers {
        let id = resolve_device(dashboard, identifier)?.id;
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Ok(ids)
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(action: &str, message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))
}
