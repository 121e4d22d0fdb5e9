//! Configuration file management.
//!
//! Settings live in `~/.sporganiser/config.ini`. A missing file yields the
//! defaults; command-line flags override whatever the file says.
//!
//! ```ini
//! [xplane]
//! install_dir = ~/X-Plane 12
//!
//! [organiser]
//! include_unclassified = false
//! carry_over = true
//! global_airports_placeholder = true
//! workers = 0
//! cache_file = ~/.sporganiser/airport_cache.bin
//! ```

mod file;
mod keys;

pub use file::{
    config_directory, config_file_path, ConfigFile, ConfigFileError, OrganiserSettings,
    XplaneSettings, CONFIG_DIR_NAME, CONFIG_FILE_NAME,
};
pub use keys::{ConfigKey, ConfigKeyError};
