// ── Read-only reference entities ──

use serde::Serialize;

use super::entity_id::EntityId;

/// Device category lookup (Phone, Laptop, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: EntityId,
    pub name: String,
}

/// Physical location lookup (Office, Living Room, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    pub id: EntityId,
    pub name: String,
}
