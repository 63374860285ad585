//! Clap derive structures for the `lanboard` CLI.
//!
//! Only clap and clap_complete may be used here: build.rs includes this
//! file to render man pages.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// lanboard -- see who and what is on your home network
#[derive(Debug, Parser)]
#[command(
    name = "lanboard",
    version,
    about = "Browse and curate the devices on your home network",
    long_about = "A command-line dashboard for a network inventory backend.\n\n\
        Lists saved devices with live presence, surfaces unknown MAC addresses\n\
        seen by the scanner, and lets you name, assign, and group devices by owner.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Backend profile to use
    #[arg(long, short = 'p', env = "LANBOARD_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Backend URL (overrides profile)
    #[arg(long, short = 'u', env = "LANBOARD_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "LANBOARD_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "LANBOARD_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage saved devices
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// Manage owners and their devices
    #[command(alias = "own")]
    Owners(OwnersArgs),

    /// MAC addresses seen recently that no device claims
    #[command(alias = "unk")]
    Unknown(UnknownArgs),

    /// List device categories
    #[command(alias = "cat")]
    Categories,

    /// List device locations
    #[command(alias = "loc")]
    Locations,

    /// Live device table that follows the scanner
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  DEVICES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// List saved devices, most recently seen first
    #[command(alias = "ls")]
    List(DeviceListArgs),

    /// Show one device (by ID or MAC address)
    Get {
        /// Device ID or MAC address
        device: String,
    },

    /// Save a new device
    Create(DeviceFields),

    /// Edit a saved device; unset flags keep their current value
    Update {
        /// Device ID or MAC address
        device: String,

        #[command(flatten)]
        fields: DeviceFields,

        /// Remove the device from its owner
        #[arg(long, conflicts_with = "owner")]
        clear_owner: bool,

        /// Remove the device from its location
        #[arg(long, conflicts_with = "location")]
        clear_location: bool,
    },

    /// Delete a saved device
    #[command(alias = "rm")]
    Delete {
        /// Device ID or MAC address
        device: String,
    },
}

#[derive(Debug, Args)]
pub struct DeviceListArgs {
    /// Only devices claimed by this owner (ID or name, repeatable)
    #[arg(long, conflicts_with = "unassigned")]
    pub owner: Vec<String>,

    /// Only devices at this location ID (repeatable)
    #[arg(long)]
    pub location: Vec<u64>,

    /// Only devices in this category ID (repeatable)
    #[arg(long)]
    pub category: Vec<u64>,

    /// Only devices nobody has claimed
    #[arg(long)]
    pub unassigned: bool,

    /// Only devices with this presence
    #[arg(long, value_parser = ["online", "away", "offline"])]
    pub presence: Option<String>,
}

#[derive(Debug, Args)]
pub struct DeviceFields {
    /// Display name; an empty string falls back to the composed name
    #[arg(long)]
    pub name: Option<String>,

    /// Hardware model
    #[arg(long)]
    pub model: Option<String>,

    /// Category ID (required for new devices)
    #[arg(long)]
    pub category: Option<u64>,

    /// Location ID
    #[arg(long)]
    pub location: Option<u64>,

    /// Owner ID or name
    #[arg(long)]
    pub owner: Option<String>,

    /// MAC address or MAC record ID (repeatable; replaces the current set)
    #[arg(long = "mac", value_name = "MAC")]
    pub macs: Vec<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  OWNERS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct OwnersArgs {
    #[command(subcommand)]
    pub command: OwnersCommand,
}

#[derive(Debug, Subcommand)]
pub enum OwnersCommand {
    /// List owners
    #[command(alias = "ls")]
    List,

    /// Show one owner and the devices they claim
    Get {
        /// Owner ID or name
        owner: String,
    },

    /// Create an owner
    Create {
        /// Owner name
        name: String,

        /// Device ID or MAC address to claim (repeatable)
        #[arg(long = "device", value_name = "DEVICE")]
        devices: Vec<String>,
    },

    /// Rename an owner or change which devices they claim
    Update {
        /// Owner ID or name
        owner: String,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// Replace the claimed devices with these (repeatable)
        #[arg(long = "device", value_name = "DEVICE", conflicts_with_all = ["add", "remove"])]
        devices: Vec<String>,

        /// Claim an additional device (repeatable)
        #[arg(long, value_name = "DEVICE")]
        add: Vec<String>,

        /// Release a device (repeatable)
        #[arg(long, value_name = "DEVICE")]
        remove: Vec<String>,
    },

    /// Delete an owner; their devices become unassigned
    #[command(alias = "rm")]
    Delete {
        /// Owner ID or name
        owner: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  UNKNOWN
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct UnknownArgs {
    /// Only MACs seen within this many days (0 = all; default from profile)
    #[arg(long)]
    pub days: Option<u32>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  WATCH
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Start paused (no polling until resumed with `p`)
    #[arg(long)]
    pub paused: bool,

    /// Polling period in seconds (overrides profile)
    #[arg(long)]
    pub interval: Option<u64>,

    /// Show unknown MACs instead of saved devices
    #[arg(long)]
    pub unknown: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Print the config file path
    Path,

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
