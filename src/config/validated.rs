//! Validated configuration after merging CLI and TOML sources.
//!
//! This module contains the final, validated configuration that is used
//! by the application. All validation is performed during construction.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use regex::Regex;

use crate::network::classify::{PhysicalPolicy, PolicyExtensions, PolicyKind};

use super::cli::Cli;
use super::defaults;
use super::error::ConfigError;
use super::toml::TomlConfig;

/// Fully validated configuration ready for use by the application.
///
/// # Construction
///
/// Use [`ValidatedConfig::from_raw`] to create from CLI args and optional TOML config,
/// or [`ValidatedConfig::load`] to also locate and read the config file.
#[derive(Debug)]
pub struct ValidatedConfig {
    /// Track only physical adapters
    pub physical_only: bool,

    /// Selected classification strategy
    pub policy: PolicyKind,

    /// User additions to the built-in classification tables
    pub extensions: PolicyExtensions,

    /// Safety-net polling interval
    pub poll_interval: Duration,

    /// Whether to use polling only (no OS notifications)
    pub poll_only: bool,

    /// Print the list command's output as JSON
    pub json: bool,

    /// Verbose logging enabled
    pub verbose: bool,

    /// Config file that was loaded, if any
    pub source: Option<PathBuf>,
}

impl fmt::Display for ValidatedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = self
            .source
            .as_ref()
            .map_or_else(|| "none".to_string(), |p| p.display().to_string());

        write!(
            f,
            "Config {{ physical_only: {}, policy: {}, exclude_names: {}, deny_keywords: {}, \
             poll_interval: {}s, poll_only: {}, config_file: {} }}",
            self.physical_only,
            self.policy,
            self.extensions.exclude_names.len(),
            self.extensions.deny_keywords.len(),
            self.poll_interval.as_secs(),
            self.poll_only,
            source,
        )
    }
}

impl ValidatedConfig {
    /// Creates a validated configuration from CLI arguments and optional TOML config.
    ///
    /// CLI arguments take precedence over TOML config values.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The policy name is unknown
    /// - Regex patterns are invalid
    /// - The poll interval is zero
    pub fn from_raw(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Self, ConfigError> {
        let physical_only = cli.physical_only || toml.is_some_and(|t| t.classifier.physical_only);
        let policy = Self::resolve_policy(cli, toml)?;
        let extensions = Self::build_extensions(cli, toml)?;
        let poll_interval = Self::resolve_poll_interval(cli, toml)?;
        let poll_only = cli.poll_only || toml.is_some_and(|t| t.monitor.poll_only);

        Ok(Self {
            physical_only,
            policy,
            extensions,
            poll_interval,
            poll_only,
            json: cli.json,
            verbose: cli.verbose,
            source: None,
        })
    }

    /// Loads and merges configuration from CLI and the config file.
    ///
    /// Uses `cli.config` when given; otherwise the file at
    /// [`defaults::config_path`] is read if it exists.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The config file cannot be read or parsed
    /// - The merged configuration is invalid
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        Self::load_with_default(cli, defaults::config_path().as_deref())
    }

    /// Like [`load`](Self::load), with an explicit implicit-file location.
    ///
    /// # Errors
    ///
    /// See [`load`](Self::load).
    pub fn load_with_default(cli: &Cli, default_path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match (&cli.config, default_path) {
            (Some(explicit), _) => Some(explicit.clone()),
            (None, Some(implicit)) if implicit.is_file() => Some(implicit.to_path_buf()),
            (None, _) => None,
        };

        let toml = path.as_deref().map(TomlConfig::load).transpose()?;

        let mut config = Self::from_raw(cli, toml.as_ref())?;
        config.source = path;
        Ok(config)
    }

    /// Builds the configured physical-adapter policy.
    #[must_use]
    pub fn build_policy(&self) -> Box<dyn PhysicalPolicy> {
        self.policy.build(&self.extensions)
    }

    fn resolve_policy(cli: &Cli, toml: Option<&TomlConfig>) -> Result<PolicyKind, ConfigError> {
        if let Some(arg) = cli.policy {
            return Ok(arg.into());
        }

        match toml.and_then(|t| t.classifier.policy.as_deref()) {
            Some(name) => name.parse().map_err(|_| ConfigError::InvalidPolicy {
                value: name.to_string(),
            }),
            None => Ok(defaults::POLICY),
        }
    }

    fn build_extensions(
        cli: &Cli,
        toml: Option<&TomlConfig>,
    ) -> Result<PolicyExtensions, ConfigError> {
        // CLI lists replace TOML lists.
        let patterns = if cli.exclude_names.is_empty() {
            toml.map_or(&[][..], |t| t.classifier.exclude_names.as_slice())
        } else {
            cli.exclude_names.as_slice()
        };
        let keywords = if cli.deny_keywords.is_empty() {
            toml.map_or(&[][..], |t| t.classifier.deny_keywords.as_slice())
        } else {
            cli.deny_keywords.as_slice()
        };

        let exclude_names = patterns
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegex {
                    pattern: pattern.clone(),
                    source: e,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        // A blank keyword would match every description.
        let deny_keywords = keywords
            .iter()
            .map(|keyword| keyword.trim())
            .filter(|keyword| !keyword.is_empty())
            .map(str::to_string)
            .collect();

        Ok(PolicyExtensions {
            exclude_names,
            deny_keywords,
        })
    }

    fn resolve_poll_interval(
        cli: &Cli,
        toml: Option<&TomlConfig>,
    ) -> Result<Duration, ConfigError> {
        // Priority: CLI explicit > TOML > default
        let seconds = cli
            .poll_interval
            .or_else(|| toml.and_then(|t| t.monitor.poll_interval))
            .unwrap_or(defaults::POLL_INTERVAL_SECS);

        if seconds == 0 {
            return Err(ConfigError::InvalidDuration {
                field: "poll_interval",
                reason: "must be greater than 0".to_string(),
            });
        }

        Ok(Duration::from_secs(seconds))
    }
}

/// Writes the default configuration template to a file.
///
/// Missing parent directories are created.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    let write_error = |e: std::io::Error| ConfigError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_error)?;
    }
    std::fs::write(path, super::toml::default_config_template()).map_err(write_error)
}
