//! DSF tile probing.
//!
//! Tells overlay packs from base meshes by reading the `HEAD` atom of the
//! first decodable DSF tile and looking for the `sim/overlay 1` property.
//! The result is a classification hint; packs without readable tiles get no
//! hint at all.

mod error;
mod reader;

pub use error::DsfError;
pub use reader::{has_overlay_property, read_head_atom, HEAD_ATOM, OVERLAY_PROPERTY};

#[cfg(test)]
pub(crate) use reader::build_dsf;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, trace};

/// DSF file extension.
pub const DSF_EXTENSION: &str = "dsf";

/// Tile folder names look like `+47-123`.
fn tile_dir_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[+-]\d{2}[+-]\d{3}").expect("tile pattern is valid"))
}

/// Sorted subdirectories / files of `dir`, empty on error.
fn sorted_children(dir: &Path, want_dirs: bool) -> Vec<PathBuf> {
    let Ok(read) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut children: Vec<PathBuf> = read
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_dir() == want_dirs)
        .collect();
    children.sort();
    children
}

/// Probe the DSF tiles under an `Earth nav data` folder.
///
/// Tiles are tried in name order; the first one that decodes decides. A
/// compressed or damaged tile moves on to the next.
///
/// # Errors
///
/// [`DsfError::NoTiles`] if there are no DSF files at all, otherwise the error
/// of the last tile tried.
pub fn probe_overlay(earth_nav_data: &Path) -> Result<bool, DsfError> {
    let mut last_error = None;

    let tile_dirs = sorted_children(earth_nav_data, true)
        .into_iter()
        .filter(|dir| {
            dir.file_name()
                .is_some_and(|n| tile_dir_pattern().is_match(&n.to_string_lossy()))
        });

    for tile_dir in tile_dirs {
        let dsfs = sorted_children(&tile_dir, false).into_iter().filter(|f| {
            f.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(DSF_EXTENSION))
        });

        for dsf in dsfs {
            match has_overlay_property(&dsf) {
                Ok(overlay) => {
                    debug!(tile = %dsf.display(), overlay, "Probed DSF tile");
                    return Ok(overlay);
                }
                Err(e) => {
                    trace!(tile = %dsf.display(), error = %e, "Skipping undecodable DSF tile");
                    last_error = Some(e);
                }
            }
        }
    }

    Err(last_error.unwrap_or_else(|| DsfError::NoTiles(earth_nav_data.to_path_buf())))
}
