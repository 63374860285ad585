// ── Generic reactive entity store ──
//
// One store per entity type. The snapshot lives in a `watch` channel and is
// replaced wholesale on every change, so readers never see a collection
// being edited and new subscribers get the latest value first.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, warn};

use super::source::EntitySource;
use crate::model::{Entity, EntityId};
use crate::notification::{Notification, Notifier};
use crate::stream::EntityStream;

/// Immutable view of a store's contents at one point in time.
pub type Snapshot<T> = Arc<Vec<Arc<T>>>;

/// What a call to [`EntityStore::refresh`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The snapshot was replaced with `count` fetched entities.
    Refreshed { count: usize },
    /// Another refresh was already in flight; no request was issued.
    Coalesced,
    /// The fetch failed; the previous snapshot is still in place.
    Failed { message: String },
}

impl RefreshOutcome {
    pub fn is_refreshed(&self) -> bool {
        matches!(self, Self::Refreshed { .. })
    }
}

/// Reactive cache for one entity collection.
///
/// Mutations keep insertion order: a merge replaces an existing entity in
/// place and appends a new one. Operations that leave the contents
/// unchanged do not notify subscribers.
pub struct EntityStore<T: Entity> {
    snapshot: watch::Sender<Snapshot<T>>,
    last_refreshed: watch::Sender<Option<DateTime<Utc>>>,
    refreshing: AtomicBool,
    source: Arc<dyn EntitySource<T>>,
    notifier: Notifier,
}

/// Clears the in-flight flag even if the refresh future is dropped.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<T: Entity> EntityStore<T> {
    pub fn new(source: Arc<dyn EntitySource<T>>, notifier: Notifier) -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));
        let (last_refreshed, _) = watch::channel(None);

        Self {
            snapshot,
            last_refreshed,
            refreshing: AtomicBool::new(false),
            source,
            notifier,
        }
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Current snapshot (cheap `Arc` clone).
    pub fn snapshot(&self) -> Snapshot<T> {
        self.snapshot.borrow().clone()
    }

    pub fn get(&self, id: EntityId) -> Option<Arc<T>> {
        self.snapshot.borrow().iter().find(|e| e.id() == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.snapshot.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.borrow().is_empty()
    }

    /// Replay-latest subscription: the stream's `current()` is the snapshot
    /// at subscription time, later changes arrive through `changed()`.
    pub fn subscribe(&self) -> EntityStream<T> {
        EntityStream::new(self.snapshot.subscribe())
    }

    pub fn last_refreshed(&self) -> Option<DateTime<Utc>> {
        *self.last_refreshed.borrow()
    }

    pub fn subscribe_last_refreshed(&self) -> watch::Receiver<Option<DateTime<Utc>>> {
        self.last_refreshed.subscribe()
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing.load(Ordering::Acquire)
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Upsert by id. Returns `true` if the snapshot changed.
    pub fn merge(&self, entity: T) -> bool {
        self.merge_many(std::iter::once(entity)) > 0
    }

    /// Upsert a batch with a single emission. Returns how many entities
    /// were inserted or actually changed.
    pub fn merge_many(&self, entities: impl IntoIterator<Item = T>) -> usize {
        let incoming: Vec<T> = entities.into_iter().collect();
        if incoming.is_empty() {
            return 0;
        }

        let mut changed = 0;
        self.snapshot.send_if_modified(|snap| {
            let mut next: Vec<Arc<T>> = snap.to_vec();
            for entity in incoming {
                match next.iter().position(|e| e.id() == entity.id()) {
                    Some(idx) if *next[idx] == entity => {}
                    Some(idx) => {
                        next[idx] = Arc::new(entity);
                        changed += 1;
                    }
                    None => {
                        next.push(Arc::new(entity));
                        changed += 1;
                    }
                }
            }
            if changed > 0 {
                *snap = Arc::new(next);
            }
            changed > 0
        });

        if changed > 0 {
            debug!(kind = T::KIND, changed, "merged into store");
        }
        changed
    }

    /// Drop the entity with `id`. Absent ids are a silent no-op.
    pub fn remove(&self, id: EntityId) -> Option<Arc<T>> {
        let mut removed = None;
        self.snapshot.send_if_modified(|snap| {
            let Some(idx) = snap.iter().position(|e| e.id() == id) else {
                return false;
            };
            let mut next: Vec<Arc<T>> = snap.to_vec();
            removed = Some(next.remove(idx));
            *snap = Arc::new(next);
            true
        });

        if removed.is_some() {
            debug!(kind = T::KIND, %id, "removed from store");
        }
        removed
    }

    /// Drop every listed id with a single emission. Returns how many were present.
    pub fn remove_many(&self, ids: &[EntityId]) -> usize {
        let mut count = 0;
        self.snapshot.send_if_modified(|snap| {
            let before = snap.len();
            let next: Vec<Arc<T>> = snap
                .iter()
                .filter(|e| !ids.contains(&e.id()))
                .cloned()
                .collect();
            count = before - next.len();
            if count > 0 {
                *snap = Arc::new(next);
            }
            count > 0
        });
        count
    }

    /// Swap in a whole new collection. Emits only if the contents differ.
    pub fn replace_all(&self, entities: Vec<T>) -> bool {
        let next: Vec<Arc<T>> = entities.into_iter().map(Arc::new).collect();
        self.snapshot.send_if_modified(|snap| {
            if **snap == next {
                return false;
            }
            *snap = Arc::new(next);
            true
        })
    }

    // ── Refresh ──────────────────────────────────────────────────────

    /// Fetch the full collection and replace the snapshot.
    ///
    /// Never fails: a failed fetch leaves the snapshot as it was, logs a
    /// warning and publishes a notification. A call made while another
    /// refresh is pending returns [`RefreshOutcome::Coalesced`] without
    /// touching the backend.
    ///
    /// The fetched collection is authoritative. A merge applied while the
    /// fetch was in flight is overwritten if the backend response predates it.
    pub async fn refresh(&self) -> RefreshOutcome {
        if self
            .refreshing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(kind = T::KIND, "refresh already in flight, coalescing");
            return RefreshOutcome::Coalesced;
        }
        let _guard = InFlight(&self.refreshing);

        match self.source.fetch_all().await {
            Ok(entities) => {
                let count = entities.len();
                self.replace_all(entities);
                self.last_refreshed.send_replace(Some(Utc::now()));
                debug!(kind = T::KIND, count, "store refreshed");
                RefreshOutcome::Refreshed { count }
            }
            Err(e) => {
                warn!(kind = T::KIND, error = %e, "refresh failed, keeping previous snapshot");
                self.notifier.publish(Notification::error(e.user_message()));
                RefreshOutcome::Failed {
                    message: e.to_string(),
                }
            }
        }
    }
}
