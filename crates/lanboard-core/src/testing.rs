// ── In-memory fixtures for unit tests ──

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use futures_util::FutureExt;
use futures_util::future::BoxFuture;

use crate::error::CoreError;
use crate::model::{Category, Device, EntityId, Location, Mac, MacAddress, Owner, OwnerRef};
use crate::notification::Notifier;
use crate::store::{DataStore, EntitySource};

/// Serves whatever collections the test put in, for every entity type.
#[derive(Default)]
pub(crate) struct MemorySource {
    pub devices: Mutex<Vec<Device>>,
    pub owners: Mutex<Vec<Owner>>,
    pub macs: Mutex<Vec<Mac>>,
    pub categories: Mutex<Vec<Category>>,
    pub locations: Mutex<Vec<Location>>,
    pub fail: std::sync::atomic::AtomicBool,
    pub fetches: std::sync::atomic::AtomicUsize,
}

macro_rules! memory_source_for {
    ($ty:ty, $field:ident) => {
        impl EntitySource<$ty> for MemorySource {
            fn fetch_all(&self) -> BoxFuture<'_, Result<Vec<$ty>, CoreError>> {
                self.fetches
                    .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                let result = if self.fail.load(std::sync::atomic::Ordering::SeqCst) {
                    Err(CoreError::ConnectionFailed {
                        url: "memory".into(),
                        reason: "offline".into(),
                    })
                } else {
                    Ok(self.$field.lock().map(|v| v.clone()).unwrap_or_default())
                };
                async move { result }.boxed()
            }
        }
    };
}

memory_source_for!(Device, devices);
memory_source_for!(Owner, owners);
memory_source_for!(Mac, macs);
memory_source_for!(Category, categories);
memory_source_for!(Location, locations);

pub(crate) fn data_store() -> (DataStore, Arc<MemorySource>) {
    let source = Arc::new(MemorySource::default());
    (DataStore::new(&source, Notifier::new()), source)
}

pub(crate) fn mac(id: u64, seen: Option<DateTime<Utc>>) -> Mac {
    let mut m = Mac::new(EntityId::new(id), MacAddress::new(format!("aa:bb:cc:dd:ee:{id:02x}")));
    m.last_seen = seen;
    m
}

pub(crate) fn device(id: u64, owner: Option<(u64, &str)>) -> Device {
    let primary = mac(id + 100, None);
    Device {
        id: EntityId::new(id),
        name: Some(format!("device-{id}")),
        model: None,
        category: Some(Category {
            id: EntityId::new(1),
            name: "Laptop".into(),
        }),
        location: None,
        owner: owner.map(|(oid, name)| OwnerRef {
            id: EntityId::new(oid),
            name: name.into(),
        }),
        macs: vec![primary.clone()],
        primary_mac: Some(primary),
    }
}

pub(crate) fn owner(id: u64, name: &str, devices: &[u64]) -> Owner {
    Owner {
        id: EntityId::new(id),
        name: name.into(),
        devices: devices
            .iter()
            .map(|&d| device(d, Some((id, name))))
            .collect(),
    }
}
