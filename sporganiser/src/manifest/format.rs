//! `scenery_packs.ini` format.
//!
//! ```text
//! I
//! 1000 Version
//! SCENERY
//!
//! SCENERY_PACK Custom Scenery/KSEA_Demo/
//! SCENERY_PACK *GLOBAL_AIRPORTS*
//! SCENERY_PACK_DISABLED /mnt/ortho/zOrtho4XP_+47-123/
//! ```
//!
//! Packs inside `Custom Scenery` are written relative to the X-Plane
//! install, everything else with its absolute path.

use std::path::{Path, PathBuf};

/// Manifest file name inside `Custom Scenery`.
pub const MANIFEST_FILE: &str = "scenery_packs.ini";

/// Companion file listing the packs that could not be classified.
pub const UNSORTED_FILE: &str = "scenery_packs_unsorted.ini";

/// Scenery folder name inside the X-Plane install.
pub const CUSTOM_SCENERY_DIR: &str = "Custom Scenery";

/// Fixed file header.
pub const HEADER: &str = "I\n1000 Version\nSCENERY\n\n";

pub const PACK_DIRECTIVE: &str = "SCENERY_PACK";
pub const DISABLED_DIRECTIVE: &str = "SCENERY_PACK_DISABLED";

/// X-Plane 12 stand-in for the bundled global airports.
pub const GLOBAL_AIRPORTS_TOKEN: &str = "*GLOBAL_AIRPORTS*";

/// One directive line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IniLine {
    pub enabled: bool,
    /// Target as written, without the trailing separator.
    pub target: String,
}

impl IniLine {
    pub fn is_global_airports(&self) -> bool {
        self.target == GLOBAL_AIRPORTS_TOKEN
    }

    /// Render with trailing newline. Paths get a trailing `/`, the global
    /// airports token does not.
    pub fn render(&self) -> String {
        let directive = if self.enabled {
            PACK_DIRECTIVE
        } else {
            DISABLED_DIRECTIVE
        };
        if self.is_global_airports() {
            format!("{} {}\n", directive, self.target)
        } else {
            format!("{} {}/\n", directive, self.target)
        }
    }
}

/// Parse directive lines, ignoring the header and anything unrecognised.
pub fn parse(text: &str) -> Vec<IniLine> {
    text.lines()
        .filter_map(|line| {
            let line = line.trim_end_matches('\r');
            let (directive, rest) = line.split_once(' ')?;
            let enabled = match directive {
                PACK_DIRECTIVE => true,
                DISABLED_DIRECTIVE => false,
                _ => return None,
            };
            let target = rest.trim();
            let target = target
                .strip_suffix('/')
                .or_else(|| target.strip_suffix('\\'))
                .unwrap_or(target);
            if target.is_empty() {
                return None;
            }
            Some(IniLine {
                enabled,
                target: target.to_string(),
            })
        })
        .collect()
}

/// Manifest text for a pack path.
///
/// `scenery_dir` is the canonical `Custom Scenery` folder. Direct children
/// become `Custom Scenery/<name>`; anything else stays absolute.
pub fn target_text(path: &Path, scenery_dir: &Path) -> String {
    match path.strip_prefix(scenery_dir) {
        Ok(rel) if rel.components().count() == 1 => {
            format!("{}/{}", CUSTOM_SCENERY_DIR, rel.to_string_lossy())
        }
        _ => path.to_string_lossy().to_string(),
    }
}

/// Filesystem path of a manifest target.
///
/// Relative targets are resolved against the X-Plane install folder.
pub fn target_path(target: &str, install_dir: &Path) -> PathBuf {
    let path = Path::new(target);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        install_dir.join(path)
    }
}
