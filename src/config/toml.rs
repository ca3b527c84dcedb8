//! TOML configuration file parsing.
//!
//! Defines the structure of the configuration file with serde.

use std::path::Path;

use serde::Deserialize;

use super::ConfigError;

/// Root configuration structure from TOML file.
///
/// All fields are optional to allow partial configuration
/// that can be merged with CLI arguments.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    /// Adapter classification section
    #[serde(default)]
    pub classifier: ClassifierSection,

    /// Monitoring configuration
    #[serde(default)]
    pub monitor: MonitorSection,
}

/// Adapter classification section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassifierSection {
    /// Track only physical adapters
    #[serde(default)]
    pub physical_only: bool,

    /// Policy name: "binding", "name", or "combined"
    pub policy: Option<String>,

    /// Extra regex patterns for non-physical adapter names
    #[serde(default)]
    pub exclude_names: Vec<String>,

    /// Extra description keywords for non-physical adapters
    #[serde(default)]
    pub deny_keywords: Vec<String>,
}

/// Monitoring configuration section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MonitorSection {
    /// Polling interval in seconds
    pub poll_interval: Option<u64>,

    /// Disable OS change notifications, use polling only
    #[serde(default)]
    pub poll_only: bool,
}

impl TomlConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::from)
    }
}

/// Generates a default configuration file with comments.
#[must_use]
pub fn default_config_template() -> String {
    r#"# nicwatch configuration file

[classifier]
# Track only adapters classified as physical hardware
physical_only = false

# Classification strategy: "binding", "name", or "combined" (default)
#   binding  - requires an IPv4 binding, rejects proprietary-virtual types
#              and virtualization keywords in the description
#   name     - rejects NDIS filter-chain names and VPN product keywords
#   combined - both must accept
# policy = "combined"

# Extra regex patterns for adapter names to treat as non-physical
# Note: CLI patterns REPLACE these entirely (not merged)
# exclude_names = ["^vEthernet", "^Bluetooth"]

# Extra description keywords to treat as non-physical (case-insensitive)
# Note: CLI keywords REPLACE these entirely (not merged)
# deny_keywords = ["usb"]

[monitor]
# Safety-net polling interval in seconds (default: 60)
poll_interval = 60

# Disable OS change notifications, use polling only
# poll_only = false
"#
    .to_string()
}
