// lanboard-core: Reactive entity cache between lanboard-api and consumers (CLI).

pub mod backend;
pub mod command;
pub mod config;
pub mod convert;
pub mod dashboard;
pub mod error;
pub mod model;
pub mod notification;
pub mod resolver;
pub mod scheduler;
pub mod status;
pub mod store;
pub mod stream;

#[cfg(test)]
mod testing;

// ── Primary re-exports ──────────────────────────────────────────────
pub use backend::Backend;
pub use command::{Command, CommandResult, DeviceDraft, OwnerDraft};
pub use config::DashboardConfig;
pub use dashboard::{ConnectionState, Dashboard};
pub use error::{CoreError, GENERIC_FAILURE_MESSAGE};
pub use notification::{Notification, NotificationLevel, Notifier};
pub use resolver::{ConsistencyResolver, Violation};
pub use scheduler::{RefreshScheduler, RefreshTarget};
pub use status::{DeviceStatus, Presence};
pub use store::{DataStore, EntityStore, RefreshOutcome, RefreshReport, Snapshot};
pub use stream::{DeviceFilter, EntityStream};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    Category, Device, Discovery, Entity, EntityId, Location, Mac, MacAddress, Owner, OwnerRef,
    Port, sort_by_recency,
};
