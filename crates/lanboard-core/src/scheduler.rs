// ── Periodic refresh driver ──
//
// Ticks at a fixed interval and refreshes its target while live mode is
// on. Paused mode keeps the last snapshot on screen and simply skips
// ticks. Cancellation is final: once disposed (or dropped) the task
// exits and no refresh fires again.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::store::DataStore;

/// What the scheduler refreshes on each live tick.
pub trait RefreshTarget: Send + Sync + 'static {
    /// Run one refresh. `true` when fresh data landed.
    fn refresh(&self) -> BoxFuture<'_, bool>;
}

impl RefreshTarget for DataStore {
    /// Devices and MACs: the unknown-device rows depend on both.
    fn refresh(&self) -> BoxFuture<'_, bool> {
        async move {
            let (devices, _macs) = self.refresh_live().await;
            devices.is_refreshed()
        }
        .boxed()
    }
}

/// Handle to a running refresh loop.
pub struct RefreshScheduler {
    live_mode: watch::Sender<bool>,
    last_refresh_at: Arc<watch::Sender<Option<DateTime<Utc>>>>,
    interval: Duration,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl RefreshScheduler {
    /// Start ticking every `interval`. The first tick comes one full
    /// interval after spawning; the caller owns the initial load.
    pub fn spawn(target: Arc<dyn RefreshTarget>, interval: Duration, live_mode: bool) -> Self {
        let (live_tx, live_rx) = watch::channel(live_mode);
        let (last_tx, _) = watch::channel(None);
        let last_refresh_at = Arc::new(last_tx);
        let cancel = CancellationToken::new();

        let handle = tokio::spawn(refresh_loop(
            target,
            interval,
            live_rx,
            Arc::clone(&last_refresh_at),
            cancel.clone(),
        ));

        debug!(interval_secs = interval.as_secs(), live_mode, "refresh scheduler started");

        Self {
            live_mode: live_tx,
            last_refresh_at,
            interval,
            cancel,
            handle: Some(handle),
        }
    }

    /// Pause or resume polling. Turning live mode on refreshes at once;
    /// setting the current value again does nothing.
    pub fn set_live_mode(&self, enabled: bool) {
        self.live_mode.send_if_modified(|live| {
            if *live == enabled {
                false
            } else {
                *live = enabled;
                true
            }
        });
    }

    pub fn live_mode(&self) -> bool {
        *self.live_mode.borrow()
    }

    pub fn subscribe_live_mode(&self) -> watch::Receiver<bool> {
        self.live_mode.subscribe()
    }

    /// When a scheduled (or live-resume) refresh last succeeded.
    pub fn last_refresh_at(&self) -> Option<DateTime<Utc>> {
        *self.last_refresh_at.borrow()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Stop the timer and wait for the loop to exit. An in-flight
    /// refresh is abandoned, not awaited.
    pub async fn dispose(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!(error = %e, "refresh scheduler task ended abnormally");
            }
        }
        debug!("refresh scheduler disposed");
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn refresh_loop(
    target: Arc<dyn RefreshTarget>,
    interval: Duration,
    mut live_rx: watch::Receiver<bool>,
    last_refresh_at: Arc<watch::Sender<Option<DateTime<Utc>>>>,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await; // consume the immediate first tick

    loop {
        let run = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            changed = live_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let live = *live_rx.borrow_and_update();
                debug!(live, "live mode toggled");
                if live {
                    ticker.reset();
                }
                live
            }
            _ = ticker.tick() => *live_rx.borrow(),
        };

        if !run {
            continue;
        }

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            refreshed = target.refresh() => {
                if refreshed {
                    last_refresh_at.send_replace(Some(Utc::now()));
                } else {
                    debug!("scheduled refresh brought no new data");
                }
            }
        }
    }

    debug!("refresh loop exited");
}
