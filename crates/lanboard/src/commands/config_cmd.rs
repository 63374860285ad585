//! Config subcommand handlers.

use dialoguer::{Confirm, Input};

use lanboard_config::{Config, Profile};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::available_profiles;
use crate::error::CliError;
use crate::output;

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => init(),

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = lanboard_config::load_config()?;
            let as_toml = toml::to_string_pretty(&cfg).map_err(lanboard_config::ConfigError::from)?;
            let out = output::render_single(
                &global.output,
                &cfg,
                |_| as_toml.trim_end().to_owned(),
                |c| c.default_profile.clone().unwrap_or_default(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            output::print_output(
                &lanboard_config::config_path().display().to_string(),
                global.quiet,
            );
            Ok(())
        }

        // ── Profiles ────────────────────────────────────────────────
        ConfigCommand::Profiles => {
            let cfg = lanboard_config::load_config_or_default();
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: lanboard config init");
            } else {
                let lines: Vec<String> = cfg
                    .profiles
                    .iter()
                    .map(|(name, profile)| {
                        let marker = if name == default { " *" } else { "" };
                        format!("{name}{marker}\t{}", profile.api_url)
                    })
                    .collect();
                output::print_output(&lines.join("\n"), global.quiet);
            }
            Ok(())
        }

        // ── Use <name> ─────────────────────────────────────────────
        ConfigCommand::Use { name } => {
            let mut cfg = lanboard_config::load_config_or_default();

            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: available_profiles(&cfg),
                    name,
                });
            }

            cfg.default_profile = Some(name.clone());
            lanboard_config::save_config(&cfg)?;
            eprintln!("✓ Default profile set to '{name}'");
            Ok(())
        }
    }
}

fn init() -> Result<(), CliError> {
    let config_path = lanboard_config::config_path();
    eprintln!("lanboard configuration wizard");
    eprintln!("   Config path: {}\n", config_path.display());

    let mut cfg: Config = lanboard_config::load_config_or_default();

    // 1. Profile name
    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default("default".into())
        .interact_text()
        .map_err(prompt_err)?;

    // 2. Backend URL, checked before anything is written
    let api_url: String = Input::new()
        .with_prompt("Backend URL")
        .default("http://127.0.0.1:8000".into())
        .validate_with(|input: &String| {
            lanboard_config::parse_api_url(input)
                .map(|_| ())
                .map_err(|e| e.to_string())
        })
        .interact_text()
        .map_err(prompt_err)?;

    // 3. Push channel
    let push_path: String = Input::new()
        .with_prompt("Scan push path (blank to poll only)")
        .default("/ws".into())
        .allow_empty(true)
        .interact_text()
        .map_err(prompt_err)?;

    // 4. Polling period
    let refresh_interval: u64 = Input::new()
        .with_prompt("Refresh interval (seconds, 0 disables polling)")
        .default(cfg.defaults.refresh_interval)
        .interact_text()
        .map_err(prompt_err)?;

    let mut profile = Profile::new(api_url.trim());
    profile.push_path = Some(push_path).filter(|p| !p.trim().is_empty());
    if refresh_interval != cfg.defaults.refresh_interval {
        profile.refresh_interval = Some(refresh_interval);
    }

    let make_default = cfg.profiles.is_empty()
        || Confirm::new()
            .with_prompt(format!("Make '{profile_name}' the default profile?"))
            .default(true)
            .interact()
            .map_err(prompt_err)?;

    cfg.profiles.insert(profile_name.clone(), profile);
    if make_default {
        cfg.default_profile = Some(profile_name.clone());
    }

    let path = lanboard_config::save_config(&cfg)?;

    eprintln!("\n✓ Configuration written to {}", path.display());
    eprintln!("  Profile: {profile_name}");
    eprintln!("\n  Test it: lanboard --profile {profile_name} devices list");
    Ok(())
}
