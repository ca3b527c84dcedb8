//! Default values for configuration options.
//!
//! Centralized constants to avoid magic numbers scattered across the codebase.

use std::path::PathBuf;
use std::time::Duration;

use crate::network::classify::PolicyKind;

/// Default polling interval in seconds.
pub const POLL_INTERVAL_SECS: u64 = 60;

/// Default physical-adapter policy.
pub const POLICY: PolicyKind = PolicyKind::Combined;

/// Directory name under the platform config directory.
pub const APP_DIR: &str = "nicwatch";

/// Configuration file name, also the default `init` output.
pub const CONFIG_FILE: &str = "nicwatch.toml";

/// Default polling interval as Duration.
#[must_use]
pub const fn poll_interval() -> Duration {
    Duration::from_secs(POLL_INTERVAL_SECS)
}

/// Location of the implicit config file, e.g.
/// `~/.config/nicwatch/nicwatch.toml` or `%APPDATA%\nicwatch\nicwatch.toml`.
#[must_use]
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}
