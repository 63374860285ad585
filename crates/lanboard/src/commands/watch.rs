//! `lanboard watch`: a self-refreshing device table.
//!
//! Keeps one dashboard connected with the scheduler (and push bridge, if
//! the profile names one) running, and redraws whenever a store emits.
//! Notifications go to stderr. Line commands on stdin: `p` pause/resume,
//! `r` refresh now, `q` quit.

use std::future::Future;
use std::io::IsTerminal;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tokio::time::MissedTickBehavior;

use lanboard_core::{Dashboard, DashboardConfig, Notification, sort_by_recency};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

use super::devices::{DeviceRow, DeviceView};
use super::unknown::UnknownRow;

/// Presence decays with time alone, so redraw even when nothing emits.
const REDRAW_EVERY: Duration = Duration::from_secs(15);

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

pub async fn handle(
    mut config: DashboardConfig,
    args: WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if let Some(secs) = args.interval {
        config.refresh_interval = Duration::from_secs(secs);
    }
    if args.paused {
        config.live_mode = false;
    }

    let dashboard = Dashboard::new(config)?;
    dashboard.connect().await?;
    let result = watch_loop(&dashboard, &args, global, tokio::signal::ctrl_c()).await;
    dashboard.disconnect().await;
    result
}

/// Redraw until `shutdown` resolves, the user quits, or the stores close.
async fn watch_loop<F: Future>(
    dashboard: &Dashboard,
    args: &WatchArgs,
    global: &GlobalOpts,
    shutdown: F,
) -> Result<(), CliError> {
    let screen = Screen {
        color: output::should_color(&global.color),
        clear: matches!(global.output, OutputFormat::Table) && std::io::stdout().is_terminal(),
    };

    let mut devices = dashboard.devices();
    let mut macs = dashboard.macs();
    let mut live = dashboard.subscribe_live_mode();
    let mut notifications = dashboard.notifications();
    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    // Armed once so a signal between iterations is not lost.
    tokio::pin!(shutdown);

    let mut redraw = tokio::time::interval(REDRAW_EVERY);
    redraw.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = redraw.tick() => {}
            changed = devices.changed() => {
                if changed.is_none() {
                    break;
                }
            }
            changed = macs.changed() => {
                if changed.is_none() {
                    break;
                }
            }
            changed = live.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            received = notifications.recv() => {
                match received {
                    Ok(n) => report(&n, screen.color),
                    Err(RecvError::Lagged(_)) => {}
                    Err(RecvError::Closed) => break,
                }
                // Keep the message on screen until the next redraw.
                continue;
            }
            line = input.next_line(), if stdin_open => match line {
                Ok(Some(line)) => match line.trim() {
                    "q" | "quit" => break,
                    "p" | "pause" => dashboard.set_live_mode(!dashboard.live_mode()).await,
                    "r" | "refresh" => {
                        let outcome = dashboard.refresh().await;
                        if let Some(reason) = outcome.first_failure() {
                            tracing::warn!(reason, "manual refresh failed");
                        }
                    }
                    other => tracing::debug!(input = other, "ignored watch input"),
                },
                Ok(None) | Err(_) => stdin_open = false,
            },
        }

        screen.draw(dashboard, args, global).await?;
    }
    Ok(())
}

fn report(notification: &Notification, color: bool) {
    eprintln!(
        "{} {}",
        output::notification_prefix(notification.level, color),
        notification.message
    );
}

struct Screen {
    color: bool,
    clear: bool,
}

impl Screen {
    async fn draw(
        &self,
        dashboard: &Dashboard,
        args: &WatchArgs,
        global: &GlobalOpts,
    ) -> Result<(), CliError> {
        let now = Utc::now();
        let color = self.color;

        let (body, count) = if args.unknown {
            let views: Vec<DeviceView> = dashboard
                .unknown_devices(now)
                .into_iter()
                .map(|d| DeviceView::new(Arc::new(d), now))
                .collect();
            let body = output::render_list(
                &global.output,
                &views,
                |v| UnknownRow::new(v, color),
                DeviceView::primary_address,
            )?;
            (body, views.len())
        } else {
            let mut devices = dashboard.devices_snapshot().to_vec();
            sort_by_recency(&mut devices);
            let views: Vec<DeviceView> = devices
                .into_iter()
                .map(|d| DeviceView::new(d, now))
                .collect();
            let body = output::render_list(
                &global.output,
                &views,
                |v| DeviceRow::new(v, color),
                DeviceView::id,
            )?;
            (body, views.len())
        };

        let mut frame = String::new();
        if self.clear {
            frame.push_str(CLEAR_SCREEN);
        }
        frame.push_str(&body);

        // Structured formats stay machine-readable: one document per frame.
        if self.clear {
            let age = dashboard
                .last_refresh_at()
                .await
                .and_then(|at| (now - at).to_std().ok())
                .map_or_else(
                    || "never".to_owned(),
                    |age| {
                        let whole = Duration::from_secs(age.as_secs());
                        format!("{} ago", humantime::format_duration(whole))
                    },
                );
            let mode = if dashboard.live_mode() { "live" } else { "paused" };
            frame.push_str(&format!(
                "\n{mode} · {count} rows · refreshed {age} · [p] pause/resume  [r] refresh  [q] quit"
            ));
        }

        output::print_output(&frame, global.quiet);
        Ok(())
    }
}
