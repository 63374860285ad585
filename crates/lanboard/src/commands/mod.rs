//! Command dispatch: bridges CLI args -> core Commands -> output formatting.

pub mod config_cmd;
pub mod devices;
pub mod lookups;
pub mod owners;
pub mod unknown;
pub mod util;
pub mod watch;

use lanboard_core::{Dashboard, DashboardConfig};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a backend-bound command to the appropriate handler.
///
/// Everything but `watch` runs against a one-shot dashboard: load every
/// store once, run the handler, disconnect.
pub async fn dispatch(
    cmd: Command,
    config: DashboardConfig,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if let Command::Watch(args) = cmd {
        return watch::handle(config, args, global).await;
    }

    Dashboard::oneshot(config, |dashboard| async move {
        Ok(run(&dashboard, cmd, global).await)
    })
    .await?
}

async fn run(dashboard: &Dashboard, cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Devices(args) => devices::handle(dashboard, args, global).await,
        Command::Owners(args) => owners::handle(dashboard, args, global).await,
        Command::Unknown(args) => unknown::handle(dashboard, &args, global),
        Command::Categories => lookups::categories(dashboard, global),
        Command::Locations => lookups::locations(dashboard, global),
        // Handled before a dashboard exists
        Command::Watch(_) | Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
