// ── Reactive storage ──

mod data_store;
mod entity_store;
mod source;

pub use data_store::{DataStore, InventorySource, RefreshReport};
pub use entity_store::{EntityStore, RefreshOutcome, Snapshot};
pub use source::EntitySource;
