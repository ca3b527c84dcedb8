//! Configuration layer for nicwatch.
//!
//! This module provides:
//! - CLI argument parsing ([`Cli`], [`Command`])
//! - TOML configuration file parsing ([`TomlConfig`])
//! - Validated configuration ([`ValidatedConfig`])
//! - Configuration file generation ([`write_default_config`])
//! - Default values ([`defaults`])
//!
//! # Priority
//!
//! Configuration values are resolved with the following priority (highest to lowest):
//!
//! 1. **Explicit CLI arguments** - Values explicitly passed via command line
//! 2. **TOML config file** - `--config`, or `nicwatch/nicwatch.toml` under the
//!    platform config directory when it exists
//! 3. **Built-in defaults** - `policy = combined`, `poll_interval = 60`
//!
//! For list options (`exclude_names`, `deny_keywords`), CLI values **replace**
//! TOML values entirely (not merged). Each list is handled independently.
//!
//! # Boolean Flag Semantics
//!
//! Boolean flags (`--physical-only`, `--poll-only`) use OR semantics:
//! - If set `true` in either CLI or TOML, the result is `true`.
//! - Once set `true` in TOML, CLI cannot override to `false`.

mod cli;
pub mod defaults;
mod error;
mod toml;
mod validated;

#[cfg(test)]
mod validated_tests;

pub use cli::{Cli, Command, PolicyArg};
pub use error::ConfigError;
pub use toml::{ClassifierSection, MonitorSection, TomlConfig, default_config_template};
pub use validated::{ValidatedConfig, write_default_config};
