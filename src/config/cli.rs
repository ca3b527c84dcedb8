//! CLI argument parsing using clap.
//!
//! Defines the command-line interface with all options and subcommands.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::network::classify::PolicyKind;

use super::defaults;

/// nicwatch: network adapter inventory
///
/// Keeps a live, classified list of the host's network adapters and
/// reports adapters as they appear and disappear.
#[derive(Debug, Parser)]
#[command(name = "nicwatch")]
#[command(version, about, long_about = None)]
#[allow(clippy::struct_excessive_bools)] // CLI flags are naturally boolean
pub struct Cli {
    /// Subcommand to run (default: watch)
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Track only adapters classified as physical hardware
    #[arg(long = "physical-only", global = true)]
    pub physical_only: bool,

    /// Classification strategy used with --physical-only
    #[arg(long, value_enum, global = true)]
    pub policy: Option<PolicyArg>,

    /// Regex for adapter names to treat as non-physical (can be specified multiple times)
    #[arg(long = "exclude-name", value_name = "PATTERN", global = true)]
    pub exclude_names: Vec<String>,

    /// Description keyword to treat as non-physical (can be specified multiple times)
    #[arg(long = "deny-keyword", value_name = "WORD", global = true)]
    pub deny_keywords: Vec<String>,

    /// Safety-net polling interval in seconds
    #[arg(long = "poll-interval", global = true)]
    pub poll_interval: Option<u64>,

    /// Disable OS change notifications, use polling only
    #[arg(long = "poll-only", global = true)]
    pub poll_only: bool,

    /// Print the adapter list as JSON (list command)
    #[arg(long, global = true)]
    pub json: bool,

    /// Path to configuration file
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

/// Subcommands for nicwatch
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Print the current adapters once and exit
    List,

    /// Track adapters and log changes until interrupted
    Watch,

    /// Generate a default configuration file
    Init {
        /// Output path for the configuration file
        #[arg(long, short, default_value = defaults::CONFIG_FILE)]
        output: PathBuf,
    },
}

/// Policy argument for CLI parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    /// IPv4 binding, interface type and virtualization keywords
    Binding,
    /// NDIS filter names and VPN product keywords
    Name,
    /// Both strategies must accept
    Combined,
}

impl From<PolicyArg> for PolicyKind {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Binding => Self::Binding,
            PolicyArg::Name => Self::Name,
            PolicyArg::Combined => Self::Combined,
        }
    }
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Parses CLI arguments from an iterator (useful for testing).
    pub fn parse_from_iter<I, T>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::parse_from(iter)
    }

    /// Returns the selected command, defaulting to [`Command::Watch`].
    #[must_use]
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Watch)
    }

    /// Returns true if this is the init command.
    #[must_use]
    pub const fn is_init(&self) -> bool {
        matches!(self.command, Some(Command::Init { .. }))
    }
}
