// ── Dashboard abstraction ──
//
// Composition root for one backend: owns the stores, the refresh
// scheduler, the push bridge and the command processor. Consumers clone
// the handle and read snapshots, subscribe to streams, or send commands.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use lanboard_api::push::push_url;
use lanboard_api::{ApiClient, PushHandle, ReconnectConfig, ScanEvent, ScanEventKind, TransportConfig};
use tokio::sync::{Mutex, broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backend::Backend;
use crate::command::{Command, CommandEnvelope, CommandResult};
use crate::config::DashboardConfig;
use crate::error::CoreError;
use crate::model::{Category, Device, Location, Mac, Owner};
use crate::notification::{Notification, Notifier};
use crate::resolver::ConsistencyResolver;
use crate::scheduler::RefreshScheduler;
use crate::store::{DataStore, RefreshReport, Snapshot};
use crate::stream::EntityStream;

const COMMAND_CHANNEL_SIZE: usize = 64;

// ── ConnectionState ──────────────────────────────────────────────────

/// Connection state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

// ── Dashboard ────────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<DashboardInner>`. Nothing talks to the
/// backend until [`connect()`](Self::connect).
#[derive(Clone)]
pub struct Dashboard {
    inner: Arc<DashboardInner>,
}

struct DashboardInner {
    config: DashboardConfig,
    backend: Arc<Backend>,
    store: Arc<DataStore>,
    connection_state: watch::Sender<ConnectionState>,
    live_mode: watch::Sender<bool>,
    command_tx: Mutex<mpsc::Sender<CommandEnvelope>>,
    command_rx: Mutex<Option<mpsc::Receiver<CommandEnvelope>>>,
    cancel: CancellationToken,
    /// Cancelled on disconnect, replaced on connect.
    cancel_child: Mutex<CancellationToken>,
    scheduler: Mutex<Option<RefreshScheduler>>,
    push: Mutex<Option<PushHandle>>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Dashboard {
    /// Build the stores and HTTP client. Does not connect.
    pub fn new(config: DashboardConfig) -> Result<Self, CoreError> {
        let transport = TransportConfig::with_timeout(config.timeout);
        let client = ApiClient::new(config.api_url.as_str(), &transport)?;
        let backend = Arc::new(Backend::new(client));
        let store = Arc::new(DataStore::new(&backend, Notifier::new()));

        let (connection_state, _) = watch::channel(ConnectionState::Disconnected);
        let (live_mode, _) = watch::channel(config.live_mode);
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
        let cancel = CancellationToken::new();
        let cancel_child = cancel.child_token();

        Ok(Self {
            inner: Arc::new(DashboardInner {
                config,
                backend,
                store,
                connection_state,
                live_mode,
                command_tx: Mutex::new(command_tx),
                command_rx: Mutex::new(Some(command_rx)),
                cancel,
                cancel_child: Mutex::new(cancel_child),
                scheduler: Mutex::new(None),
                push: Mutex::new(None),
                task_handles: Mutex::new(Vec::new()),
            }),
        })
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &Arc<DataStore> {
        &self.inner.store
    }

    // ── Connection lifecycle ─────────────────────────────────────────

    /// Load every store, then start the command processor, the refresh
    /// scheduler and (if configured) the push bridge.
    ///
    /// Fails only when nothing could be loaded; a partial load is
    /// reported through notifications and retried on the next tick.
    pub async fn connect(&self) -> Result<(), CoreError> {
        self.inner.connection_state.send_replace(ConnectionState::Connecting);

        let report = self.inner.store.refresh_all().await;
        if report.all_failed() {
            self.inner.connection_state.send_replace(ConnectionState::Failed);
            return Err(CoreError::ConnectionFailed {
                url: self.inner.config.api_url.to_string(),
                reason: report.first_failure().unwrap_or("no data").to_owned(),
            });
        }
        if let Some(reason) = report.first_failure() {
            warn!(reason, "initial load was incomplete");
        }

        let child = self.inner.cancel.child_token();
        *self.inner.cancel_child.lock().await = child.clone();

        let mut handles = self.inner.task_handles.lock().await;

        if let Some(rx) = self.inner.command_rx.lock().await.take() {
            handles.push(tokio::spawn(command_processor_task(
                self.clone(),
                rx,
                child.clone(),
            )));
        }

        let config = &self.inner.config;
        if !config.refresh_interval.is_zero() {
            let scheduler = RefreshScheduler::spawn(
                self.inner.store.clone(),
                config.refresh_interval,
                self.live_mode(),
            );
            *self.inner.scheduler.lock().await = Some(scheduler);
        }

        if let Some(path) = config.push_path.as_deref() {
            let ws_url = push_url(self.inner.backend.client().base_url(), path)?;
            let push = PushHandle::connect(
                ws_url,
                ReconnectConfig::default(),
                child.child_token(),
            );
            let events = push.subscribe();
            *self.inner.push.lock().await = Some(push);
            handles.push(tokio::spawn(push_bridge_task(self.clone(), events, child)));
        }

        self.inner.connection_state.send_replace(ConnectionState::Connected);
        info!(
            url = %config.api_url,
            devices = self.inner.store.devices().len(),
            owners = self.inner.store.owners().len(),
            "dashboard connected"
        );
        Ok(())
    }

    /// Stop every background task and wait for them to exit. Snapshots
    /// stay readable and a later `connect` starts fresh tasks.
    pub async fn disconnect(&self) {
        self.inner.cancel_child.lock().await.cancel();

        if let Some(push) = self.inner.push.lock().await.take() {
            push.shutdown();
        }
        if let Some(scheduler) = self.inner.scheduler.lock().await.take() {
            scheduler.dispose().await;
        }

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            if let Err(e) = handle.await {
                warn!(error = %e, "background task ended abnormally");
            }
        }
        drop(handles);

        // The old receiver was consumed by the processor task.
        let (tx, rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
        *self.inner.command_tx.lock().await = tx;
        *self.inner.command_rx.lock().await = Some(rx);

        self.inner
            .connection_state
            .send_replace(ConnectionState::Disconnected);
        info!("dashboard disconnected");
    }

    /// One-shot: connect, run closure, disconnect.
    ///
    /// For the CLI: no scheduler and no push bridge, just the initial load
    /// and whatever commands `f` sends.
    pub async fn oneshot<F, Fut, T>(config: DashboardConfig, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(Dashboard) -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        let mut cfg = config;
        cfg.refresh_interval = std::time::Duration::ZERO;
        cfg.push_path = None;

        let dashboard = Dashboard::new(cfg)?;
        dashboard.connect().await?;
        let result = f(dashboard.clone()).await;
        dashboard.disconnect().await;
        result
    }

    // ── Refresh control ──────────────────────────────────────────────

    /// Pause or resume polling. Resuming refreshes at once; pausing keeps
    /// the last snapshot visible.
    pub async fn set_live_mode(&self, enabled: bool) {
        let changed = self.inner.live_mode.send_if_modified(|live| {
            let changed = *live != enabled;
            *live = enabled;
            changed
        });
        if !changed {
            return;
        }

        info!(live = enabled, "live mode changed");
        let scheduled = {
            let scheduler = self.inner.scheduler.lock().await;
            if let Some(scheduler) = scheduler.as_ref() {
                scheduler.set_live_mode(enabled);
            }
            scheduler.is_some()
        };
        // Without a timer the resume refresh is ours to run.
        if enabled && !scheduled {
            self.inner.store.refresh_live().await;
        }
    }

    pub fn live_mode(&self) -> bool {
        *self.inner.live_mode.borrow()
    }

    pub fn subscribe_live_mode(&self) -> watch::Receiver<bool> {
        self.inner.live_mode.subscribe()
    }

    /// Forwarded push signal: refresh devices and MACs if live.
    /// Returns whether a refresh ran.
    pub async fn signal_refresh(&self) -> bool {
        if !self.live_mode() {
            debug!("refresh signal ignored while paused");
            return false;
        }
        self.inner.store.refresh_live().await;
        true
    }

    /// Refresh every store now, regardless of live mode.
    pub async fn refresh(&self) -> RefreshReport {
        self.inner.store.refresh_all().await
    }

    /// Last successful scheduled refresh, or the last device load when
    /// the scheduler has not fired yet.
    pub async fn last_refresh_at(&self) -> Option<DateTime<Utc>> {
        let scheduled = self
            .inner
            .scheduler
            .lock()
            .await
            .as_ref()
            .and_then(RefreshScheduler::last_refresh_at);
        scheduled.max(self.inner.store.last_refresh())
    }

    // ── Command execution ────────────────────────────────────────────

    /// Send a command to the processor and wait for its result.
    pub async fn execute(&self, cmd: Command) -> Result<CommandResult, CoreError> {
        if *self.inner.connection_state.borrow() != ConnectionState::Connected {
            return Err(CoreError::Disconnected);
        }

        let (tx, rx) = tokio::sync::oneshot::channel();
        let command_tx = self.inner.command_tx.lock().await.clone();

        command_tx
            .send(CommandEnvelope {
                command: cmd,
                response_tx: tx,
            })
            .await
            .map_err(|_| CoreError::Disconnected)?;

        rx.await.map_err(|_| CoreError::Disconnected)?
    }

    // ── State observation ────────────────────────────────────────────

    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection_state.subscribe()
    }

    /// Transient banners: failed refreshes and failed commands.
    pub fn notifications(&self) -> broadcast::Receiver<Notification> {
        self.inner.store.notifier().subscribe()
    }

    // ── Snapshot accessors (delegate to DataStore) ───────────────────

    pub fn devices_snapshot(&self) -> Snapshot<Device> {
        self.inner.store.devices_snapshot()
    }

    pub fn owners_snapshot(&self) -> Snapshot<Owner> {
        self.inner.store.owners_snapshot()
    }

    pub fn macs_snapshot(&self) -> Snapshot<Mac> {
        self.inner.store.macs_snapshot()
    }

    pub fn categories_snapshot(&self) -> Snapshot<Category> {
        self.inner.store.categories_snapshot()
    }

    pub fn locations_snapshot(&self) -> Snapshot<Location> {
        self.inner.store.locations_snapshot()
    }

    /// Unknown-device rows within the configured window.
    pub fn unknown_devices(&self, now: DateTime<Utc>) -> Vec<Device> {
        self.inner
            .store
            .unknown_devices(now, self.inner.config.unknown_window_days)
    }

    // ── Stream accessors (delegate to DataStore) ─────────────────────

    pub fn devices(&self) -> EntityStream<Device> {
        self.inner.store.subscribe_devices()
    }

    pub fn owners(&self) -> EntityStream<Owner> {
        self.inner.store.subscribe_owners()
    }

    pub fn macs(&self) -> EntityStream<Mac> {
        self.inner.store.subscribe_macs()
    }
}

// ── Background tasks ─────────────────────────────────────────────────

/// Run commands one at a time so resolver passes never interleave.
async fn command_processor_task(
    dashboard: Dashboard,
    mut rx: mpsc::Receiver<CommandEnvelope>,
    cancel: CancellationToken,
) {

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            envelope = rx.recv() => {
                let Some(envelope) = envelope else { break };
                let label = envelope.command.describe();
                let result = route_command(&dashboard, envelope.command).await;
                if let Err(ref e) = result {
                    warn!(command = label, error = %e, "command failed");
                    dashboard
                        .inner
                        .store
                        .notifier()
                        .publish(Notification::error(e.user_message()));
                }
                let _ = envelope.response_tx.send(result);
            }
        }
    }
}

/// Turn scan events into refresh signals.
async fn push_bridge_task(
    dashboard: Dashboard,
    mut events: broadcast::Receiver<Arc<ScanEvent>>,
    cancel: CancellationToken,
) {

    loop {
        let event = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            event = events.recv() => event,
        };

        match event {
            Ok(event) if event.kind == ScanEventKind::Error => {
                let message = event.message().unwrap_or("Scan failed.").to_owned();
                dashboard
                    .inner
                    .store
                    .notifier()
                    .publish(Notification::error(message));
            }
            Ok(event) if event.kind.triggers_refresh() => {
                debug!(kind = ?event.kind, "scan event, refreshing");
                dashboard.signal_refresh().await;
            }
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "push bridge lagged, refreshing");
                dashboard.signal_refresh().await;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

// ── Command routing ──────────────────────────────────────────────────

/// Validate, call the backend, then reconcile both stores from the
/// confirmed response. Nothing is merged unless the backend said yes.
async fn route_command(dashboard: &Dashboard, cmd: Command) -> Result<CommandResult, CoreError> {
    let backend = &dashboard.inner.backend;
    let store = &dashboard.inner.store;
    let resolver = ConsistencyResolver::new(store.devices(), store.owners());

    match cmd {
        // ── Devices ──────────────────────────────────────────────────
        Command::CreateDevice(draft) => {
            draft.validate()?;
            let device = backend.create_device(&draft.to_request()).await?;
            Ok(CommandResult::Device(resolver.device_saved(device)))
        }

        Command::UpdateDevice { id, draft } => {
            draft.validate()?;
            let device = backend.update_device(id, &draft.to_request()).await?;
            Ok(CommandResult::Device(resolver.device_saved(device)))
        }

        Command::DeleteDevice { id } => {
            backend.delete_device(id).await?;
            resolver.device_deleted(id);
            Ok(CommandResult::Deleted(id))
        }

        // ── Owners ───────────────────────────────────────────────────
        Command::CreateOwner(draft) => {
            draft.validate(&store.owners_snapshot(), None)?;
            let owner = backend.create_owner(&draft.to_request()).await?;
            Ok(CommandResult::Owner(resolver.owner_saved(owner)))
        }

        Command::UpdateOwner { id, draft } => {
            draft.validate(&store.owners_snapshot(), Some(id))?;
            let owner = backend.update_owner(id, &draft.to_request()).await?;
            Ok(CommandResult::Owner(resolver.owner_saved(owner)))
        }

        Command::DeleteOwner { id } => {
            backend.delete_owner(id).await?;
            resolver.owner_deleted(id);
            Ok(CommandResult::Deleted(id))
        }
    }
}
