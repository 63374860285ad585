//! Scan push channel with auto-reconnect.
//!
//! The scanning backend announces its progress over a WebSocket. Each text
//! frame is a JSON object `{ "event": "scan_progress", "data": { ... } }`.
//! Frames are parsed into [`ScanEvent`]s and fanned out through a
//! [`tokio::sync::broadcast`] channel. Reconnection uses exponential backoff
//! with jitter.
//!
//! Nothing downstream relies on ordering or on the payload schema; a frame is
//! a hint that the device and MAC collections are worth re-fetching.
//!
//! ```rust,ignore
//! use lanboard_api::push::{PushHandle, ReconnectConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! let url = url::Url::parse("ws://10.0.0.2:8000/ws/scan")?;
//! let handle = PushHandle::connect(url, ReconnectConfig::default(), CancellationToken::new());
//! let mut rx = handle.subscribe();
//! while let Ok(event) = rx.recv().await {
//!     if event.kind.triggers_refresh() { /* refresh */ }
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use serde::Deserialize;
use tokio::sync::broadcast;
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Error;

const EVENT_CHANNEL_CAPACITY: usize = 256;

// ── ScanEvent ────────────────────────────────────────────────────────

/// What the scanner is telling us.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEventKind {
    /// Free-form status line (`scan_update`).
    Update,
    /// Percentage tick while hosts are probed (`scan_progress`).
    Progress,
    /// A host finished enrichment (`device_found`).
    DeviceFound,
    /// The scan run ended (`scan_complete`).
    Complete,
    /// The scan run aborted (`scan_error`).
    Error,
    /// Anything else, keyed by the raw event name.
    Other(String),
}

impl ScanEventKind {
    fn from_name(name: &str) -> Self {
        match name {
            "scan_update" => Self::Update,
            "scan_progress" => Self::Progress,
            "device_found" => Self::DeviceFound,
            "scan_complete" => Self::Complete,
            "scan_error" => Self::Error,
            other => Self::Other(other.to_owned()),
        }
    }

    /// Whether this event means backend data may have changed.
    pub fn triggers_refresh(&self) -> bool {
        matches!(self, Self::Progress | Self::DeviceFound | Self::Complete)
    }
}

/// A parsed frame from the scan push channel.
#[derive(Debug, Clone)]
pub struct ScanEvent {
    pub kind: ScanEventKind,
    /// The frame's `data` object, untouched.
    pub payload: serde_json::Value,
}

impl ScanEvent {
    /// Human-readable `message` field, if the payload carries one.
    pub fn message(&self) -> Option<&str> {
        self.payload.get("message").and_then(serde_json::Value::as_str)
    }
}

#[derive(Debug, Deserialize)]
struct PushFrame {
    #[serde(alias = "type")]
    event: String,
    #[serde(default)]
    data: serde_json::Value,
}

// ── ReconnectConfig ──────────────────────────────────────────────────

/// Exponential backoff configuration for push reconnection.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt. Default: 1s.
    pub initial_delay: Duration,

    /// Upper bound on backoff delay. Default: 30s.
    pub max_delay: Duration,

    /// Attempts before giving up. `None` retries forever.
    pub max_retries: Option<u32>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_retries: None,
        }
    }
}

// ── PushHandle ───────────────────────────────────────────────────────

/// Handle to a running push listener.
///
/// Call [`shutdown`](Self::shutdown) (or cancel the token passed to
/// [`connect`](Self::connect)) to stop the background task.
pub struct PushHandle {
    event_rx: broadcast::Receiver<Arc<ScanEvent>>,
    cancel: CancellationToken,
}

impl PushHandle {
    /// Spawn the reconnecting listener and return immediately.
    ///
    /// The first connection attempt happens in the background task.
    pub fn connect(ws_url: Url, reconnect: ReconnectConfig, cancel: CancellationToken) -> Self {
        let (event_tx, event_rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            push_loop(ws_url, event_tx, reconnect, task_cancel).await;
        });

        Self { event_rx, cancel }
    }

    /// A new receiver for the event stream. Slow receivers see
    /// [`broadcast::error::RecvError::Lagged`].
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<ScanEvent>> {
        self.event_rx.resubscribe()
    }

    /// Signal the background task to stop.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

/// Derive the push endpoint from an HTTP base URL: `http` becomes `ws`,
/// `https` becomes `wss`, and `path` replaces the base path.
pub fn push_url(base: &Url, path: &str) -> Result<Url, Error> {
    let mut url = base.join(path)?;
    let scheme = if base.scheme() == "https" { "wss" } else { "ws" };
    url.set_scheme(scheme)
        .map_err(|()| Error::PushConnect(format!("cannot derive push URL from {base}")))?;
    Ok(url)
}

// ── Background loop ──────────────────────────────────────────────────

async fn push_loop(
    ws_url: Url,
    event_tx: broadcast::Sender<Arc<ScanEvent>>,
    reconnect: ReconnectConfig,
    cancel: CancellationToken,
) {
    let mut attempt: u32 = 0;

    loop {
        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = connect_and_read(&ws_url, &event_tx, &cancel) => result,
        };

        match result {
            Ok(()) if cancel.is_cancelled() => break,
            Ok(()) => {
                tracing::info!("push channel closed cleanly, reconnecting");
                attempt = 0;
            }
            Err(e) => {
                tracing::warn!(error = %e, attempt, "push channel error");

                if let Some(max) = reconnect.max_retries {
                    if attempt >= max {
                        tracing::error!(max_retries = max, "push reconnection limit reached");
                        break;
                    }
                }

                let delay = calculate_backoff(attempt, &reconnect);
                tracing::debug!(
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    attempt,
                    "waiting before push reconnect"
                );

                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(delay) => {}
                }

                attempt = attempt.saturating_add(1);
            }
        }
    }

    tracing::debug!("push loop exiting");
}

async fn connect_and_read(
    url: &Url,
    event_tx: &broadcast::Sender<Arc<ScanEvent>>,
    cancel: &CancellationToken,
) -> Result<(), Error> {
    tracing::info!(url = %url, "connecting to push channel");

    let (ws_stream, _response) = tokio_tungstenite::connect_async(url.as_str())
        .await
        .map_err(|e| Error::PushConnect(e.to_string()))?;

    tracing::info!("push channel connected");

    let (_write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(()),
            frame = read.next() => match frame {
                Some(Ok(tungstenite::Message::Text(text))) => {
                    parse_and_broadcast(&text, event_tx);
                }
                Some(Ok(tungstenite::Message::Close(frame))) => {
                    if let Some(cf) = frame {
                        let code = u16::from(cf.code);
                        if code != 1000 {
                            return Err(Error::PushClosed {
                                code,
                                reason: cf.reason.as_str().to_owned(),
                            });
                        }
                    }
                    return Ok(());
                }
                Some(Err(e)) => return Err(Error::PushConnect(e.to_string())),
                None => return Ok(()),
                Some(Ok(_)) => {}
            },
        }
    }
}

// ── Parsing ──────────────────────────────────────────────────────────

fn parse_frame(text: &str) -> Option<ScanEvent> {
    match serde_json::from_str::<PushFrame>(text) {
        Ok(frame) => Some(ScanEvent {
            kind: ScanEventKind::from_name(&frame.event),
            payload: frame.data,
        }),
        Err(e) => {
            tracing::debug!(error = %e, "ignoring unparseable push frame");
            None
        }
    }
}

fn parse_and_broadcast(text: &str, event_tx: &broadcast::Sender<Arc<ScanEvent>>) {
    if let Some(event) = parse_frame(text) {
        if event.kind == ScanEventKind::Error {
            tracing::warn!(message = event.message().unwrap_or(""), "scanner reported an error");
        }
        // No subscribers is fine.
        let _ = event_tx.send(Arc::new(event));
    }
}

// ── Backoff ──────────────────────────────────────────────────────────

/// `min(initial * 2^attempt, max)` with a deterministic +-25% jitter.
fn calculate_backoff(attempt: u32, config: &ReconnectConfig) -> Duration {
    let exp = i32::try_from(attempt.min(30)).unwrap_or(30);
    let base = config.initial_delay.as_secs_f64() * 2.0_f64.powi(exp);
    let capped = base.min(config.max_delay.as_secs_f64());

    let jitter_factor = 1.0 + 0.25 * (f64::from(attempt) * 7.3).sin();
    Duration::from_secs_f64((capped * jitter_factor).max(0.0))
}
