// ── Domain model ──
//
// Consumer-facing entity types. Wire types from `lanboard-api` are
// converted into these in `crate::convert`.

pub mod device;
pub mod entity_id;
pub mod lookup;
pub mod mac;
pub mod owner;

pub use device::{Device, OwnerRef, sort_by_recency};
pub use entity_id::{EntityId, MacAddress};
pub use lookup::{Category, Location};
pub use mac::{Discovery, Mac, Port};
pub use owner::Owner;

/// Anything a store can hold: addressable by a backend id.
pub trait Entity: Clone + PartialEq + Send + Sync + 'static {
    /// Lowercase singular noun used in log lines and not-found errors.
    const KIND: &'static str;

    fn id(&self) -> EntityId;
}

impl Entity for Device {
    const KIND: &'static str = "device";

    fn id(&self) -> EntityId {
        self.id
    }
}

impl Entity for Owner {
    const KIND: &'static str = "owner";

    fn id(&self) -> EntityId {
        self.id
    }
}

impl Entity for Mac {
    const KIND: &'static str = "mac";

    fn id(&self) -> EntityId {
        self.id
    }
}

impl Entity for Category {
    const KIND: &'static str = "category";

    fn id(&self) -> EntityId {
        self.id
    }
}

impl Entity for Location {
    const KIND: &'static str = "location";

    fn id(&self) -> EntityId {
        self.id
    }
}
