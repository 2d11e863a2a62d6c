// Rust guideline compliant 2026-02-06

//! Configuration management for pincheck.

use crate::marker::MarkerEnvironment;
use crate::version::Version;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Name of the optional configuration file at the repository root.
pub const CONFIG_FILE_NAME: &str = ".pincheck.toml";

/// Placeholder replaced by the extra name in `lock_file_template`.
pub const EXTRA_PLACEHOLDER: &str = "{extra}";

/// Output format for the check report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Plain,
    /// JSON document.
    Json,
}

/// Configuration for the pinned-dependency check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Lock file name per extra, relative to the project directory.
    #[serde(default = "default_lock_file_template")]
    pub lock_file_template: String,

    /// Lock file for the base requirements of projects without extras.
    #[serde(default)]
    pub base_lock_file: Option<String>,

    /// Command suggested to fix a mismatch.
    #[serde(default = "default_upgrade_command")]
    pub upgrade_command: String,

    /// Python version environment markers are evaluated for.
    #[serde(default = "default_python_version")]
    pub python_version: String,

    /// Whether pre-release pins satisfy constraints that do not name one.
    #[serde(default = "default_allow_prereleases")]
    pub allow_prereleases: bool,

    /// Stop at the first lock file with a mismatch.
    #[serde(default)]
    pub fail_fast: bool,

    /// Report format.
    #[serde(default)]
    pub output_format: OutputFormat,

    /// Overrides for marker variables such as `sys_platform`.
    #[serde(default)]
    pub markers: BTreeMap<String, String>,
}

fn default_lock_file_template() -> String {
    "requirements-{extra}.txt".to_string()
}

fn default_upgrade_command() -> String {
    "make upgrade-pinned-dependencies".to_string()
}

fn default_python_version() -> String {
    "3.11".to_string()
}

fn default_allow_prereleases() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lock_file_template: default_lock_file_template(),
            base_lock_file: None,
            upgrade_command: default_upgrade_command(),
            python_version: default_python_version(),
            allow_prereleases: default_allow_prereleases(),
            fail_fast: false,
            output_format: OutputFormat::default(),
            markers: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Loads configuration for the repository at `root`.
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values
    /// 2. Configuration file at `.pincheck.toml`, if present
    /// 3. Environment variables with `PINCHECK_` prefix
    ///
    /// # Arguments
    ///
    /// * `root` - Repository root
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file exists but cannot be read
    /// - Configuration file contains invalid TOML
    /// - Configuration values fail validation
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE_NAME);
        let config = if path.exists() {
            Self::read_file(&path)?
        } else {
            Self::default()
        };
        config.finish(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an explicit file, which must exist.
    ///
    /// Environment overrides and validation apply as in [`Config::load`].
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable, not valid TOML,
    /// or the resulting values fail validation.
    pub fn load_file(path: &Path) -> Result<Self> {
        Self::read_file(path)?.finish(|key| std::env::var(key).ok())
    }

    fn read_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| Error::Toml {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    fn finish(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        self.apply_env_overrides(lookup)?;
        self.validate()?;
        Ok(self)
    }

    /// Applies environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `PINCHECK_LOCK_FILE_TEMPLATE` - Lock file name per extra
    /// - `PINCHECK_BASE_LOCK_FILE` - Lock file for projects without extras
    /// - `PINCHECK_UPGRADE_COMMAND` - Suggested fix command
    /// - `PINCHECK_PYTHON_VERSION` - Python version for markers
    /// - `PINCHECK_ALLOW_PRERELEASES` - Accept pre-release pins (true/false)
    /// - `PINCHECK_FAIL_FAST` - Stop at the first failing lock file (true/false)
    /// - `PINCHECK_OUTPUT_FORMAT` - Output format (plain/json)
    ///
    /// `lookup` resolves a variable name to its value.
    ///
    /// # Errors
    ///
    /// Returns an error if a boolean or format value is invalid.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(val) = lookup("PINCHECK_LOCK_FILE_TEMPLATE") {
            self.lock_file_template = val;
        }

        if let Some(val) = lookup("PINCHECK_BASE_LOCK_FILE") {
            self.base_lock_file = if val.is_empty() { None } else { Some(val) };
        }

        if let Some(val) = lookup("PINCHECK_UPGRADE_COMMAND") {
            self.upgrade_command = val;
        }

        if let Some(val) = lookup("PINCHECK_PYTHON_VERSION") {
            self.python_version = val;
        }

        if let Some(val) = lookup("PINCHECK_ALLOW_PRERELEASES") {
            self.allow_prereleases = val.parse().map_err(|_| {
                Error::InvalidConfig("PINCHECK_ALLOW_PRERELEASES must be true or false".to_string())
            })?;
        }

        if let Some(val) = lookup("PINCHECK_FAIL_FAST") {
            self.fail_fast = val.parse().map_err(|_| {
                Error::InvalidConfig("PINCHECK_FAIL_FAST must be true or false".to_string())
            })?;
        }

        if let Some(val) = lookup("PINCHECK_OUTPUT_FORMAT") {
            self.output_format = match val.as_str() {
                "plain" => OutputFormat::Plain,
                "json" => OutputFormat::Json,
                _ => {
                    return Err(Error::InvalidConfig(
                        "PINCHECK_OUTPUT_FORMAT must be plain or json".to_string(),
                    ))
                }
            };
        }

        Ok(())
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - lock_file_template does not contain `{extra}`
    /// - upgrade_command is empty
    /// - python_version is not a version
    /// - a marker override names an unknown variable
    pub fn validate(&self) -> Result<()> {
        if !self.lock_file_template.contains(EXTRA_PLACEHOLDER) {
            return Err(Error::InvalidConfig(format!(
                "lock_file_template must contain {}, got '{}'",
                EXTRA_PLACEHOLDER, self.lock_file_template
            )));
        }

        if self.upgrade_command.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "upgrade_command must not be empty".to_string(),
            ));
        }

        self.marker_environment()?;
        Ok(())
    }

    /// Lock file name for `extra`.
    pub fn lock_file_name(&self, extra: &str) -> String {
        self.lock_file_template.replace(EXTRA_PLACEHOLDER, extra)
    }

    /// Builds the marker environment for the configured Python version and
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` if `python_version` does not parse or
    /// an override names an unknown variable.
    pub fn marker_environment(&self) -> Result<MarkerEnvironment> {
        let python = Version::parse(&self.python_version).map_err(|_| {
            Error::InvalidConfig(format!(
                "python_version must be a version, got '{}'",
                self.python_version
            ))
        })?;
        let mut env = MarkerEnvironment::host(&python);
        for (name, value) in &self.markers {
            env.set(name, value)?;
        }
        Ok(env)
    }
}
