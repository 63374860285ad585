// ── Central reactive data store ──
//
// Owns one EntityStore per entity type. Constructed by the composition
// root and shared by reference; there is no global instance.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::watch;

use super::entity_store::{EntityStore, RefreshOutcome, Snapshot};
use super::source::EntitySource;
use crate::model::{Category, Device, EntityId, Location, Mac, Owner};
use crate::notification::Notifier;
use crate::stream::EntityStream;

/// Anything that can fill every store.
pub trait InventorySource:
    EntitySource<Device>
    + EntitySource<Owner>
    + EntitySource<Mac>
    + EntitySource<Category>
    + EntitySource<Location>
    + 'static
{
}

impl<S> InventorySource for S where
    S: EntitySource<Device>
        + EntitySource<Owner>
        + EntitySource<Mac>
        + EntitySource<Category>
        + EntitySource<Location>
        + 'static
{
}

/// Outcome of refreshing every store at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshReport {
    pub devices: RefreshOutcome,
    pub owners: RefreshOutcome,
    pub macs: RefreshOutcome,
    pub categories: RefreshOutcome,
    pub locations: RefreshOutcome,
}

impl RefreshReport {
    fn outcomes(&self) -> [&RefreshOutcome; 5] {
        [
            &self.devices,
            &self.owners,
            &self.macs,
            &self.categories,
            &self.locations,
        ]
    }

    /// First failure message, if any store failed.
    pub fn first_failure(&self) -> Option<&str> {
        self.outcomes().into_iter().find_map(|o| match o {
            RefreshOutcome::Failed { message } => Some(message.as_str()),
            _ => None,
        })
    }

    pub fn all_failed(&self) -> bool {
        self.outcomes()
            .iter()
            .all(|o| matches!(o, RefreshOutcome::Failed { .. }))
    }
}

/// Central reactive store for all inventory entities.
pub struct DataStore {
    pub(crate) devices: EntityStore<Device>,
    pub(crate) owners: EntityStore<Owner>,
    pub(crate) macs: EntityStore<Mac>,
    pub(crate) categories: EntityStore<Category>,
    pub(crate) locations: EntityStore<Location>,
    pub(crate) last_refresh: watch::Sender<Option<DateTime<Utc>>>,
    notifier: Notifier,
}

impl DataStore {
    pub fn new<S: InventorySource>(source: &Arc<S>, notifier: Notifier) -> Self {
        let (last_refresh, _) = watch::channel(None);

        Self {
            devices: EntityStore::new(source.clone(), notifier.clone()),
            owners: EntityStore::new(source.clone(), notifier.clone()),
            macs: EntityStore::new(source.clone(), notifier.clone()),
            categories: EntityStore::new(source.clone(), notifier.clone()),
            locations: EntityStore::new(source.clone(), notifier.clone()),
            last_refresh,
            notifier,
        }
    }

    // ── Store access ─────────────────────────────────────────────────

    pub fn devices(&self) -> &EntityStore<Device> {
        &self.devices
    }

    pub fn owners(&self) -> &EntityStore<Owner> {
        &self.owners
    }

    pub fn macs(&self) -> &EntityStore<Mac> {
        &self.macs
    }

    pub fn categories(&self) -> &EntityStore<Category> {
        &self.categories
    }

    pub fn locations(&self) -> &EntityStore<Location> {
        &self.locations
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    // ── Snapshot accessors ───────────────────────────────────────────

    pub fn devices_snapshot(&self) -> Snapshot<Device> {
        self.devices.snapshot()
    }

    pub fn owners_snapshot(&self) -> Snapshot<Owner> {
        self.owners.snapshot()
    }

    pub fn macs_snapshot(&self) -> Snapshot<Mac> {
        self.macs.snapshot()
    }

    pub fn categories_snapshot(&self) -> Snapshot<Category> {
        self.categories.snapshot()
    }

    pub fn locations_snapshot(&self) -> Snapshot<Location> {
        self.locations.snapshot()
    }

    // ── Single-entity lookups ────────────────────────────────────────

    pub fn device_by_id(&self, id: EntityId) -> Option<Arc<Device>> {
        self.devices.get(id)
    }

    pub fn owner_by_id(&self, id: EntityId) -> Option<Arc<Owner>> {
        self.owners.get(id)
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn subscribe_devices(&self) -> EntityStream<Device> {
        self.devices.subscribe()
    }

    pub fn subscribe_owners(&self) -> EntityStream<Owner> {
        self.owners.subscribe()
    }

    pub fn subscribe_macs(&self) -> EntityStream<Mac> {
        self.macs.subscribe()
    }

    // ── Derived views ────────────────────────────────────────────────

    /// Rows for MACs no saved device claims, newest sighting first.
    ///
    /// With a non-zero `window_days`, MACs last seen before `now - window`
    /// (or never) are left out.
    pub fn unknown_devices(&self, now: DateTime<Utc>, window_days: u32) -> Vec<Device> {
        let devices = self.devices.snapshot();
        let claimed: HashSet<EntityId> = devices
            .iter()
            .filter(|d| d.is_saved())
            .flat_map(|d| d.macs.iter().map(|m| m.id))
            .collect();

        let cutoff = (window_days > 0).then(|| now - TimeDelta::days(i64::from(window_days)));

        let mut rows: Vec<Device> = self
            .macs
            .snapshot()
            .iter()
            .filter(|m| !claimed.contains(&m.id))
            .filter(|m| match cutoff {
                Some(cutoff) => m.last_seen.is_some_and(|seen| seen >= cutoff),
                None => true,
            })
            .map(|m| Device::from_unknown_mac(Mac::clone(m)))
            .collect();

        crate::model::sort_by_recency(&mut rows);
        rows
    }

    /// Saved devices with no owner, for picking devices to assign.
    pub fn unassigned_devices(&self) -> Vec<Arc<Device>> {
        self.devices
            .snapshot()
            .iter()
            .filter(|d| d.is_saved() && d.owner.is_none())
            .cloned()
            .collect()
    }

    // ── Refresh ──────────────────────────────────────────────────────

    /// Refresh every store concurrently.
    pub async fn refresh_all(&self) -> RefreshReport {
        let (devices, owners, macs, categories, locations) = tokio::join!(
            self.devices.refresh(),
            self.owners.refresh(),
            self.macs.refresh(),
            self.categories.refresh(),
            self.locations.refresh(),
        );

        let report = RefreshReport {
            devices,
            owners,
            macs,
            categories,
            locations,
        };
        if report.devices.is_refreshed() {
            self.mark_refreshed();
        }
        report
    }

    /// Refresh what changes between scans: devices and their MACs.
    pub async fn refresh_live(&self) -> (RefreshOutcome, RefreshOutcome) {
        let outcomes = tokio::join!(self.devices.refresh(), self.macs.refresh());
        if outcomes.0.is_refreshed() {
            self.mark_refreshed();
        }
        outcomes
    }

    pub(crate) fn mark_refreshed(&self) {
        self.last_refresh.send_replace(Some(Utc::now()));
    }

    // ── Metadata ─────────────────────────────────────────────────────

    /// When the device collection was last replaced by a successful fetch.
    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        *self.last_refresh.borrow()
    }

    pub fn subscribe_last_refresh(&self) -> watch::Receiver<Option<DateTime<Utc>>> {
        self.last_refresh.subscribe()
    }

    pub fn data_age(&self, now: DateTime<Utc>) -> Option<TimeDelta> {
        self.last_refresh().map(|t| now - t)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::{data_store, device, mac};
    use chrono::TimeZone;
    use std::sync::atomic::Ordering;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn unknown_devices_skip_claimed_macs() {
        let (store, _) = data_store();
        let claimed = device(5, None);
        let claimed_mac = claimed.macs[0].clone();
        store.devices.merge(claimed);
        store
            .macs
            .merge_many(vec![claimed_mac, mac(1, Some(now() - TimeDelta::hours(1)))]);

        let unknown = store.unknown_devices(now(), 7);

        assert_eq!(unknown.len(), 1);
        assert_eq!(unknown[0].id, EntityId::UNSAVED);
        assert_eq!(unknown[0].macs[0].id, EntityId::new(1));
    }

    #[test]
    fn unknown_devices_respect_window() {
        let (store, _) = data_store();
        store.macs.merge_many(vec![
            mac(1, Some(now() - TimeDelta::days(2))),
            mac(2, Some(now() - TimeDelta::days(8))),
            mac(3, None),
        ]);

        let recent: Vec<u64> = store
            .unknown_devices(now(), 7)
            .iter()
            .map(|d| d.macs[0].id.get())
            .collect();
        assert_eq!(recent, vec![1]);

        let everything: Vec<u64> = store
            .unknown_devices(now(), 0)
            .iter()
            .map(|d| d.macs[0].id.get())
            .collect();
        assert_eq!(everything, vec![1, 2, 3]);
    }

    #[test]
    fn unassigned_devices_are_saved_and_ownerless() {
        let (store, _) = data_store();
        store.devices.merge_many(vec![
            device(1, None),
            device(2, Some((3, "Alice"))),
            device(0, None),
        ]);

        let ids: Vec<u64> = store.unassigned_devices().iter().map(|d| d.id.get()).collect();
        assert_eq!(ids, vec![1]);
    }

    #[tokio::test]
    async fn refresh_all_fills_every_store_and_stamps_time() {
        let (store, source) = data_store();
        source.devices.lock().unwrap().push(device(1, None));
        source.macs.lock().unwrap().push(mac(9, None));
        source.categories.lock().unwrap().push(Category {
            id: EntityId::new(1),
            name: "Laptop".into(),
        });

        let report = store.refresh_all().await;

        assert!(report.first_failure().is_none());
        assert_eq!(store.devices_snapshot().len(), 1);
        assert_eq!(store.macs_snapshot().len(), 1);
        assert_eq!(store.categories_snapshot().len(), 1);
        assert!(store.last_refresh().is_some());
        assert_eq!(source.fetches.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn failed_refresh_leaves_metadata_untouched() {
        let (store, source) = data_store();
        store.devices.merge(device(1, None));
        source.fail.store(true, Ordering::SeqCst);

        let report = store.refresh_all().await;

        assert!(report.all_failed());
        assert_eq!(store.devices_snapshot().len(), 1);
        assert!(store.last_refresh().is_none());
        assert!(store.data_age(now()).is_none());
    }

    #[tokio::test]
    async fn live_refresh_touches_devices_and_macs_only() {
        let (store, source) = data_store();

        let (devices, macs) = store.refresh_live().await;

        assert!(devices.is_refreshed());
        assert!(macs.is_refreshed());
        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
        assert!(store.owners.last_refreshed().is_none());
    }
}
