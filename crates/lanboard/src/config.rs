//! Profile resolution: config file + env, then command-line overrides.

use std::time::Duration;

use lanboard_config::{Config, Profile};
use lanboard_core::DashboardConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Build a `DashboardConfig` from the config file, profile, and CLI
/// overrides.
///
/// `--api-url` alone is enough when no profile exists; other settings
/// then come from `[defaults]`.
pub fn build_dashboard_config(global: &GlobalOpts) -> Result<DashboardConfig, CliError> {
    let cfg = lanboard_config::load_config()?;
    resolve(&cfg, global)
}

fn resolve(cfg: &Config, global: &GlobalOpts) -> Result<DashboardConfig, CliError> {
    let profile = match cfg.profile(global.profile.as_deref()) {
        Ok(found) => found.map(|(_, profile)| profile.clone()),
        Err(lanboard_config::ConfigError::ProfileNotFound { name }) => {
            return Err(CliError::ProfileNotFound {
                name,
                available: available_profiles(cfg),
            });
        }
        Err(other) => return Err(other.into()),
    };

    let mut profile = match (profile, global.api_url.as_deref()) {
        (Some(mut profile), Some(url)) => {
            url.clone_into(&mut profile.api_url);
            profile
        }
        (Some(profile), None) => profile,
        (None, Some(url)) => Profile::new(url),
        (None, None) => {
            return Err(CliError::NoConfig {
                path: lanboard_config::config_path().display().to_string(),
            });
        }
    };

    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }

    let mut dashboard = profile.to_dashboard_config(&cfg.defaults)?;
    // reqwest fails every request on a zero timeout.
    if dashboard.timeout.is_zero() {
        dashboard.timeout = Duration::from_secs(1);
    }
    tracing::debug!(
        api_url = %dashboard.api_url,
        push = dashboard.push_path.is_some(),
        "resolved dashboard config"
    );
    Ok(dashboard)
}

pub fn available_profiles(cfg: &Config) -> String {
    if cfg.profiles.is_empty() {
        "(none)".into()
    } else {
        cfg.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}
