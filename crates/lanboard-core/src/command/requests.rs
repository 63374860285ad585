// ── Mutation drafts ──
//
// What a caller fills in to create or update a device or owner. Drafts
// are validated locally before anything reaches the wire; a failed check
// is a `CoreError::ValidationFailed` carrying the message to show.

use std::sync::Arc;

use lanboard_api::types::{DeviceRequest, OwnerRequest};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::model::{Device, EntityId, Owner};

/// Names that would read as a placeholder in lists and dropdowns.
pub const RESERVED_NAMES: [&str; 3] = ["none", "owner", "device"];

fn is_reserved(name: &str) -> bool {
    let folded = name.trim().to_lowercase();
    RESERVED_NAMES.contains(&folded.as_str())
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

// ── Device ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDraft {
    /// `None` (or blank) keeps the composed display name.
    pub name: Option<String>,
    pub model: Option<String>,
    pub category_id: Option<EntityId>,
    pub location_id: Option<EntityId>,
    pub owner_id: Option<EntityId>,
    pub mac_ids: Vec<EntityId>,
}

impl DeviceDraft {
    /// Draft pre-filled from an existing device, for edits.
    pub fn from_device(device: &Device) -> Self {
        Self {
            name: device.name.clone(),
            model: device.model.clone(),
            category_id: device.category.as_ref().map(|c| c.id),
            location_id: device.location.as_ref().map(|l| l.id),
            owner_id: device.owner_id(),
            mac_ids: device.macs.iter().map(|m| m.id).collect(),
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if let Some(name) = self.name.as_deref().filter(|n| is_reserved(n)) {
            return Err(CoreError::validation(format!(
                "Device name cannot be \"{name}\"."
            )));
        }
        if self.category_id.is_none() {
            return Err(CoreError::validation("Category is required."));
        }
        if self.mac_ids.is_empty() {
            return Err(CoreError::validation(
                "At least one MAC address is required.",
            ));
        }
        Ok(())
    }

    pub fn to_request(&self) -> DeviceRequest {
        DeviceRequest {
            name: non_blank(self.name.as_deref()),
            model: non_blank(self.model.as_deref()),
            category_id: self.category_id.map(EntityId::get),
            location_id: self.location_id.map(EntityId::get),
            owner_id: self.owner_id.map(EntityId::get),
            mac_ids: self.mac_ids.iter().copied().map(EntityId::get).collect(),
        }
    }
}

// ── Owner ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerDraft {
    pub name: String,
    pub device_ids: Vec<EntityId>,
}

impl OwnerDraft {
    pub fn new(name: impl Into<String>, device_ids: Vec<EntityId>) -> Self {
        Self {
            name: name.into(),
            device_ids,
        }
    }

    pub fn from_owner(owner: &Owner) -> Self {
        Self {
            name: owner.name.clone(),
            device_ids: owner.device_ids().collect(),
        }
    }

    /// Check the name against the saved owners. `editing` is the owner
    /// being updated, which may keep its own name.
    ///
    /// The duplicate check is case-sensitive and runs on the trimmed
    /// name, which is what gets sent.
    pub fn validate(
        &self,
        existing: &[Arc<Owner>],
        editing: Option<EntityId>,
    ) -> Result<(), CoreError> {
        let name = &self.name;
        if name.trim().is_empty() {
            return Err(CoreError::validation("Owner name is required."));
        }
        if is_reserved(name) {
            return Err(CoreError::validation(format!(
                "Owner name cannot be \"{name}\"."
            )));
        }
        let trimmed = name.trim();
        let taken = existing
            .iter()
            .any(|o| o.name.trim() == trimmed && Some(o.id) != editing);
        if taken {
            return Err(CoreError::validation(format!(
                "An owner with the name \"{trimmed}\" already exists."
            )));
        }
        Ok(())
    }

    pub fn to_request(&self) -> OwnerRequest {
        OwnerRequest {
            name: self.name.trim().to_owned(),
            device_ids: self.device_ids.iter().copied().map(EntityId::get).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owners(names: &[(u64, &str)]) -> Vec<Arc<Owner>> {
        names
            .iter()
            .map(|&(id, name)| {
                Arc::new(Owner {
                    id: EntityId::new(id),
                    name: name.into(),
                    devices: Vec::new(),
                })
            })
            .collect()
    }

    fn message(result: Result<(), CoreError>) -> String {
        match result {
            Err(e) => e.user_message(),
            Ok(()) => String::new(),
        }
    }

    fn valid_device() -> DeviceDraft {
        DeviceDraft {
            category_id: Some(EntityId::new(2)),
            mac_ids: vec![EntityId::new(7)],
            ..DeviceDraft::default()
        }
    }

    #[test]
    fn device_requires_category_then_macs() {
        let mut draft = DeviceDraft::default();
        assert_eq!(message(draft.validate()), "Category is required.");

        draft.category_id = Some(EntityId::new(2));
        assert_eq!(
            message(draft.validate()),
            "At least one MAC address is required."
        );

        draft.mac_ids.push(EntityId::new(7));
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn device_name_cannot_be_reserved() {
        let draft = DeviceDraft {
            name: Some(" Device ".into()),
            ..valid_device()
        };
        assert_eq!(message(draft.validate()), "Device name cannot be \" Device \".");
    }

    #[test]
    fn device_request_blanks_become_null() {
        let draft = DeviceDraft {
            name: Some("  ".into()),
            model: Some(" XPS 13 ".into()),
            owner_id: Some(EntityId::new(3)),
            ..valid_device()
        };

        let request = draft.to_request();

        assert_eq!(request.name, None);
        assert_eq!(request.model.as_deref(), Some("XPS 13"));
        assert_eq!(request.owner_id, Some(3));
        assert_eq!(request.category_id, Some(2));
        assert_eq!(request.location_id, None);
        assert_eq!(request.mac_ids, vec![7]);
    }

    #[test]
    fn owner_name_required() {
        let draft = OwnerDraft::new("   ", Vec::new());
        assert_eq!(message(draft.validate(&[], None)), "Owner name is required.");
    }

    #[test]
    fn owner_name_reserved_any_case() {
        for name in ["none", "Owner", " DEVICE "] {
            let draft = OwnerDraft::new(name, Vec::new());
            assert_eq!(
                message(draft.validate(&[], None)),
                format!("Owner name cannot be \"{name}\".")
            );
        }
    }

    #[test]
    fn owner_name_must_be_unique_exactly() {
        let saved = owners(&[(1, "Alice"), (2, "Bob")]);

        let dup = OwnerDraft::new("Alice", Vec::new());
        assert_eq!(
            message(dup.validate(&saved, None)),
            "An owner with the name \"Alice\" already exists."
        );

        // Different case is a different name.
        assert!(OwnerDraft::new("alice", Vec::new()).validate(&saved, None).is_ok());
    }

    #[test]
    fn owner_name_padding_does_not_dodge_duplicates() {
        let saved = owners(&[(1, "Alice")]);
        let draft = OwnerDraft::new(" Alice ", Vec::new());

        assert_eq!(
            message(draft.validate(&saved, None)),
            "An owner with the name \"Alice\" already exists."
        );
        // Renaming owner 1 to a padded copy of its own name is still fine.
        assert!(draft.validate(&saved, Some(EntityId::new(1))).is_ok());
    }

    #[test]
    fn owner_may_keep_its_own_name() {
        let saved = owners(&[(1, "Alice")]);
        let draft = OwnerDraft::new("Alice", vec![EntityId::new(5)]);

        assert!(draft.validate(&saved, Some(EntityId::new(1))).is_ok());
        assert!(draft.validate(&saved, Some(EntityId::new(2))).is_err());
    }

    #[test]
    fn owner_request_trims_name() {
        let request = OwnerDraft::new(" Alice ", vec![EntityId::new(5)]).to_request();
        assert_eq!(request.name, "Alice");
        assert_eq!(request.device_ids, vec![5]);
    }
}
