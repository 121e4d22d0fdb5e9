//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::path::PathBuf;
use std::process;

use sporganiser::config::ConfigFileError;
use sporganiser::organiser::OrganiserError;
use sporganiser::overlap::ResolutionError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// No X-Plane installation given on the command line or in config.ini
    NoInstallDir,
    /// Scanning Custom Scenery failed as a whole
    Scan(OrganiserError),
    /// A conflict ordering did not fit the detected groups
    Resolution(ResolutionError),
    /// Writing scenery_packs.ini failed; the previous file is intact
    Write(OrganiserError),
    /// Cache file operation failed
    Cache { path: PathBuf, error: std::io::Error },
    /// Interactive prompt failed
    Prompt(String),
    /// JSON output failed
    Json(serde_json::Error),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::NoInstallDir => {
                eprintln!();
                eprintln!("Pass the X-Plane folder with --install-dir, or store it once with:");
                eprintln!("  sporganiser config set xplane.install_dir \"/path/to/X-Plane 12\"");
            }
            CliError::Resolution(_) => {
                eprintln!();
                eprintln!("Run 'sporganiser check' to list conflict groups and their members.");
                eprintln!("Orders are one-based: --order 1=2,1,3");
            }
            CliError::Write(_) => {
                eprintln!();
                eprintln!("The previous scenery_packs.ini was left unchanged.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::NoInstallDir => write!(f, "No X-Plane installation folder configured"),
            CliError::Scan(e) => write!(f, "Scan failed: {}", e),
            CliError::Resolution(e) => write!(f, "Invalid conflict order: {}", e),
            CliError::Write(e) => write!(f, "Failed to write scenery_packs.ini: {}", e),
            CliError::Cache { path, error } => {
                write!(f, "Cache operation on '{}' failed: {}", path.display(), error)
            }
            CliError::Prompt(msg) => write!(f, "Prompt failed: {}", msg),
            CliError::Json(e) => write!(f, "Failed to produce JSON: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Scan(e) | CliError::Write(e) => Some(e),
            CliError::Resolution(e) => Some(e),
            CliError::Cache { error, .. } => Some(error),
            CliError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<OrganiserError> for CliError {
    fn from(e: OrganiserError) -> Self {
        match e {
            OrganiserError::Resolution(e) => CliError::Resolution(e),
            e @ OrganiserError::Write(_) => CliError::Write(e),
            e => CliError::Scan(e),
        }
    }
}

impl From<ResolutionError> for CliError {
    fn from(e: ResolutionError) -> Self {
        CliError::Resolution(e)
    }
}

impl From<dialoguer::Error> for CliError {
    fn from(e: dialoguer::Error) -> Self {
        CliError::Prompt(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Json(e)
    }
}
