//! Configuration key access and validation.
//!
//! Backs `sporganiser config get|set|list`: each key knows its section,
//! how to render its current value, and how to validate a new one.

use std::str::FromStr;

use thiserror::Error;

use super::file::{expand_tilde, optional_path, parse_bool, path_to_display, ConfigFile};

/// Errors that can occur when getting or setting configuration values.
#[derive(Debug, Error)]
pub enum ConfigKeyError {
    #[error("Unknown configuration key '{0}'")]
    UnknownKey(String),

    #[error("Invalid value for {key}: {reason}")]
    ValidationFailed { key: String, reason: String },
}

/// Supported configuration keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    XplaneInstallDir,
    OrganiserIncludeUnclassified,
    OrganiserCarryOver,
    OrganiserGlobalAirportsPlaceholder,
    OrganiserWorkers,
    OrganiserCacheFile,
}

impl FromStr for ConfigKey {
    type Err = ConfigKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|key| key.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ConfigKeyError::UnknownKey(s.to_string()))
    }
}

impl ConfigKey {
    /// Every supported key, in file order.
    pub fn all() -> &'static [ConfigKey] {
        &[
            ConfigKey::XplaneInstallDir,
            ConfigKey::OrganiserIncludeUnclassified,
            ConfigKey::OrganiserCarryOver,
            ConfigKey::OrganiserGlobalAirportsPlaceholder,
            ConfigKey::OrganiserWorkers,
            ConfigKey::OrganiserCacheFile,
        ]
    }

    /// Dotted name, e.g. `organiser.workers`.
    pub fn name(&self) -> &'static str {
        match self {
            ConfigKey::XplaneInstallDir => "xplane.install_dir",
            ConfigKey::OrganiserIncludeUnclassified => "organiser.include_unclassified",
            ConfigKey::OrganiserCarryOver => "organiser.carry_over",
            ConfigKey::OrganiserGlobalAirportsPlaceholder => {
                "organiser.global_airports_placeholder"
            }
            ConfigKey::OrganiserWorkers => "organiser.workers",
            ConfigKey::OrganiserCacheFile => "organiser.cache_file",
        }
    }

    /// INI section.
    pub fn section(&self) -> &'static str {
        match self {
            ConfigKey::XplaneInstallDir => "xplane",
            _ => "organiser",
        }
    }

    /// Key within the section.
    pub fn key_name(&self) -> &'static str {
        let name = self.name();
        &name[self.section().len() + 1..]
    }

    /// Current value as a string.
    pub fn get(&self, config: &ConfigFile) -> String {
        let o = &config.organiser;
        match self {
            ConfigKey::XplaneInstallDir => config
                .xplane
                .install_dir
                .as_deref()
                .map(path_to_display)
                .unwrap_or_default(),
            ConfigKey::OrganiserIncludeUnclassified => o.include_unclassified.to_string(),
            ConfigKey::OrganiserCarryOver => o.carry_over.to_string(),
            ConfigKey::OrganiserGlobalAirportsPlaceholder => {
                o.global_airports_placeholder.to_string()
            }
            ConfigKey::OrganiserWorkers => o.workers.to_string(),
            ConfigKey::OrganiserCacheFile => path_to_display(&o.cache_file),
        }
    }

    /// Validate and store a value.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigKeyError> {
        let o = &mut config.organiser;
        match self {
            ConfigKey::XplaneInstallDir => config.xplane.install_dir = optional_path(value),
            ConfigKey::OrganiserIncludeUnclassified => {
                o.include_unclassified = self.bool_value(value)?
            }
            ConfigKey::OrganiserCarryOver => o.carry_over = self.bool_value(value)?,
            ConfigKey::OrganiserGlobalAirportsPlaceholder => {
                o.global_airports_placeholder = self.bool_value(value)?
            }
            ConfigKey::OrganiserWorkers => {
                o.workers = value
                    .trim()
                    .parse()
                    .map_err(|_| self.invalid("must be 0 or a positive integer"))?
            }
            ConfigKey::OrganiserCacheFile => {
                let value = value.trim();
                if value.is_empty() {
                    return Err(self.invalid("must not be empty"));
                }
                o.cache_file = expand_tilde(value);
            }
        }
        Ok(())
    }

    fn bool_value(&self, value: &str) -> Result<bool, ConfigKeyError> {
        parse_bool(value).ok_or_else(|| self.invalid("must be true or false"))
    }

    fn invalid(&self, reason: &str) -> ConfigKeyError {
        ConfigKeyError::ValidationFailed {
            key: self.name().to_string(),
            reason: reason.to_string(),
        }
    }
}
