// ── Command API ──
//
// All writes flow through one `Command` enum. The dashboard's command
// processor runs them one at a time, so each backend call and the
// consistency pass that follows it finish before the next command starts.

pub mod requests;

use std::sync::Arc;

use crate::error::CoreError;
use crate::model::{Device, EntityId, Owner};

pub use requests::{DeviceDraft, OwnerDraft, RESERVED_NAMES};

/// A command plus the channel its result goes back on.
pub(crate) struct CommandEnvelope {
    pub command: Command,
    pub response_tx: tokio::sync::oneshot::Sender<Result<CommandResult, CoreError>>,
}

/// Every write the dashboard supports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    // ── Devices ──────────────────────────────────────────────────────
    CreateDevice(DeviceDraft),
    UpdateDevice { id: EntityId, draft: DeviceDraft },
    DeleteDevice { id: EntityId },

    // ── Owners ───────────────────────────────────────────────────────
    CreateOwner(OwnerDraft),
    UpdateOwner { id: EntityId, draft: OwnerDraft },
    DeleteOwner { id: EntityId },
}

impl Command {
    /// Short label for log lines.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::CreateDevice(_) => "create device",
            Self::UpdateDevice { .. } => "update device",
            Self::DeleteDevice { .. } => "delete device",
            Self::CreateOwner(_) => "create owner",
            Self::UpdateOwner { .. } => "update owner",
            Self::DeleteOwner { .. } => "delete owner",
        }
    }
}

/// What a confirmed command left in the stores.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandResult {
    Device(Arc<Device>),
    Owner(Arc<Owner>),
    Deleted(EntityId),
}
