//! Loading and saving `config.ini`.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

use crate::airport::CACHE_FILE_NAME;

/// Directory under the home directory holding config, cache and logs.
pub const CONFIG_DIR_NAME: &str = ".sporganiser";

/// Configuration file name inside [`CONFIG_DIR_NAME`].
pub const CONFIG_FILE_NAME: &str = "config.ini";

/// Errors that can occur when reading or writing the configuration file.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    #[error("Failed to write config file {path}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid value '{value}' for [{section}] {key}: {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    #[error("Failed to create config directory: {0}")]
    DirectoryError(std::io::Error),
}

/// `[xplane]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XplaneSettings {
    /// X-Plane installation root (the folder holding `Custom Scenery`).
    pub install_dir: Option<PathBuf>,
}

/// `[organiser]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganiserSettings {
    /// Write unclassified packs enabled instead of disabled.
    pub include_unclassified: bool,
    /// Keep enabled/disabled flags from the previous manifest.
    pub carry_over: bool,
    /// Emit `*GLOBAL_AIRPORTS*` when no Global Airports pack is installed.
    pub global_airports_placeholder: bool,
    /// Scan threads; 0 means one per available core.
    pub workers: usize,
    /// Airport cache location.
    pub cache_file: PathBuf,
}

impl Default for OrganiserSettings {
    fn default() -> Self {
        Self {
            include_unclassified: false,
            carry_over: true,
            global_airports_placeholder: true,
            workers: 0,
            cache_file: config_directory().join(CACHE_FILE_NAME),
        }
    }
}

/// Parsed `config.ini`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub xplane: XplaneSettings,
    pub organiser: OrganiserSettings,
}

impl ConfigFile {
    /// Load from the default path (`~/.sporganiser/config.ini`).
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Load from a specific path. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        parse_ini(&ini)
    }

    /// Save to the default path.
    pub fn save(&self) -> Result<(), ConfigFileError> {
        self.save_to(&config_file_path())
    }

    /// Save to a specific path, creating its parent directory.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigFileError::DirectoryError)?;
        }

        std::fs::write(path, self.to_config_string()).map_err(|source| {
            ConfigFileError::WriteError {
                path: path.to_path_buf(),
                source,
            }
        })
    }

    /// Create the default config file if it doesn't exist.
    ///
    /// Returns the path to the config file.
    pub fn ensure_exists() -> Result<PathBuf, ConfigFileError> {
        let path = config_file_path();
        if !path.exists() {
            Self::default().save_to(&path)?;
        }
        Ok(path)
    }

    /// Commented INI text as written to disk.
    fn to_config_string(&self) -> String {
        let install_dir = self
            .xplane
            .install_dir
            .as_deref()
            .map(path_to_display)
            .unwrap_or_default();
        let o = &self.organiser;

        let mut out = String::new();
        // Writing to a String cannot fail
        let _ = write!(
            out,
            "\
# SPOrganiser configuration

[xplane]
# X-Plane installation folder (contains \"Custom Scenery\")
install_dir = {install_dir}

[organiser]
# Write packs that could not be classified as enabled
include_unclassified = {include_unclassified}
# Keep enabled/disabled choices from the previous scenery_packs.ini
carry_over = {carry_over}
# Add *GLOBAL_AIRPORTS* when no Global Airports pack is installed (X-Plane 12)
global_airports_placeholder = {placeholder}
# Scan threads, 0 = one per CPU core
workers = {workers}
# Airport identifier cache
cache_file = {cache_file}
",
            include_unclassified = o.include_unclassified,
            carry_over = o.carry_over,
            placeholder = o.global_airports_placeholder,
            workers = o.workers,
            cache_file = path_to_display(&o.cache_file),
        );
        out
    }
}

/// Config directory (`~/.sporganiser`), or `./.sporganiser` without a home.
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

/// Config file path (`~/.sporganiser/config.ini`).
pub fn config_file_path() -> PathBuf {
    config_directory().join(CONFIG_FILE_NAME)
}

fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    if let Some(section) = ini.section(Some("xplane")) {
        if let Some(v) = section.get("install_dir") {
            config.xplane.install_dir = optional_path(v);
        }
    }

    if let Some(section) = ini.section(Some("organiser")) {
        if let Some(v) = section.get("include_unclassified") {
            config.organiser.include_unclassified =
                parse_bool_value("organiser", "include_unclassified", v)?;
        }
        if let Some(v) = section.get("carry_over") {
            config.organiser.carry_over = parse_bool_value("organiser", "carry_over", v)?;
        }
        if let Some(v) = section.get("global_airports_placeholder") {
            config.organiser.global_airports_placeholder =
                parse_bool_value("organiser", "global_airports_placeholder", v)?;
        }
        if let Some(v) = section.get("workers") {
            config.organiser.workers = v.trim().parse().map_err(|_| ConfigFileError::InvalidValue {
                section: "organiser".to_string(),
                key: "workers".to_string(),
                value: v.to_string(),
                reason: "must be a non-negative integer".to_string(),
            })?;
        }
        if let Some(v) = section.get("cache_file") {
            if let Some(path) = optional_path(v) {
                config.organiser.cache_file = path;
            }
        }
    }

    Ok(config)
}

fn parse_bool_value(section: &str, key: &str, value: &str) -> Result<bool, ConfigFileError> {
    parse_bool(value).ok_or_else(|| ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: "must be true or false".to_string(),
    })
}

/// Lenient boolean: true/false, yes/no, on/off, 1/0.
pub(super) fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// Expand `~` to the home directory.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

/// Empty string is `None`.
pub(super) fn optional_path(value: &str) -> Option<PathBuf> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(expand_tilde(value))
    }
}

/// Collapse the home directory back to `~`.
pub(super) fn path_to_display(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = ConfigFile::default();

        assert!(config.xplane.install_dir.is_none());
        assert!(!config.organiser.include_unclassified);
        assert!(config.organiser.carry_over);
        assert!(config.organiser.global_airports_placeholder);
        assert_eq!(config.organiser.workers, 0);
        assert!(config.organiser.cache_file.ends_with(CACHE_FILE_NAME));
    }

    #[test]
    fn test_load_nonexistent_returns_defaults() {
        let temp = TempDir::new().unwrap();
        let config = ConfigFile::load_from(&temp.path().join("missing.ini")).unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join(CONFIG_FILE_NAME);

        let mut config = ConfigFile::default();
        config.xplane.install_dir = Some(PathBuf::from("/opt/X-Plane 12"));
        config.organiser.include_unclassified = true;
        config.organiser.workers = 4;
        config.organiser.cache_file = temp.path().join("cache.bin");
        config.save_to(&path).unwrap();

        let loaded = ConfigFile::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[organiser]\ncarry_over = no\n").unwrap();

        let config = ConfigFile::load_from(&path).unwrap();
        assert!(!config.organiser.carry_over);
        assert!(config.organiser.global_airports_placeholder);
        assert!(config.xplane.install_dir.is_none());
    }

    #[test]
    fn test_invalid_bool_is_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[organiser]\ninclude_unclassified = maybe\n").unwrap();

        match ConfigFile::load_from(&path) {
            Err(ConfigFileError::InvalidValue { key, .. }) => {
                assert_eq!(key, "include_unclassified")
            }
            other => panic!("expected InvalidValue, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_workers_is_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[organiser]\nworkers = -2\n").unwrap();

        assert!(matches!(
            ConfigFile::load_from(&path),
            Err(ConfigFileError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_empty_install_dir_is_none() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[xplane]\ninstall_dir =\n").unwrap();

        let config = ConfigFile::load_from(&path).unwrap();
        assert!(config.xplane.install_dir.is_none());
    }

    #[test]
    fn test_parse_bool_variants() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool(" off "), Some(false));
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool("nope"), None);
    }

    #[test]
    fn test_expand_tilde() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde("~/X-Plane 12"), home.join("X-Plane 12"));
        }
        assert_eq!(expand_tilde("/abs/path"), PathBuf::from("/abs/path"));
    }
}
