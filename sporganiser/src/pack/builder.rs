//! Pack root inspection.
//!
//! Walks the immediate structure of one pack root, records the well-known
//! entries X-Plane cares about, and detects the folder-in-folder anomaly.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::error::DescriptorBuildError;
use super::types::{display_name_of, ContentLayout, PackDescriptor, StructuralWarning};

/// Directory holding DSF tiles and the airport file.
pub const EARTH_NAV_DATA: &str = "Earth nav data";

/// Airport definition file name.
pub const AIRPORT_FILE: &str = "apt.dat";

/// Gzip-compressed airport definition file name.
pub const AIRPORT_FILE_GZ: &str = "apt.dat.gz";

/// Minimum normalised name length for prefix-based similarity.
const MIN_PREFIX_SIMILARITY_LEN: usize = 4;

/// A visible entry of a directory listing.
#[derive(Debug, Clone)]
struct Entry {
    name: String,
    path: PathBuf,
    is_dir: bool,
}

/// Builds [`PackDescriptor`]s from pack root directories.
#[derive(Debug, Clone, Default)]
pub struct DescriptorBuilder;

impl DescriptorBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self
    }

    /// Inspect a pack root and produce an unclassified descriptor.
    ///
    /// The path must already be resolved (no shortcut indirection).
    ///
    /// # Errors
    ///
    /// - [`DescriptorBuildError::Unreadable`] if the root cannot be listed
    /// - [`DescriptorBuildError::Empty`] if it has no visible entries
    /// - [`DescriptorBuildError::NoRecognizableContent`] if nothing in it is
    ///   scenery content
    pub fn build(&self, path: &Path) -> Result<PackDescriptor, DescriptorBuildError> {
        let entries = list_visible(path)?;
        if entries.is_empty() {
            return Err(DescriptorBuildError::Empty(path.to_path_buf()));
        }

        let root_name = display_name_of(path);
        let nested = nested_duplicate(&root_name, &entries);

        let (content_root, content_entries, warning) = match nested {
            Some(inner) => {
                warn!(
                    pack = %root_name,
                    inner = %inner.display(),
                    "Pack looks like a folder-in-folder extraction"
                );
                let inner_entries = list_visible(&inner)?;
                let warning = StructuralWarning::NestedDuplicate {
                    inner: inner.clone(),
                };
                (inner, inner_entries, Some(warning))
            }
            None => (path.to_path_buf(), entries, None),
        };

        let content = inspect_layout(content_root, &content_entries);
        if !content.is_recognizable() {
            return Err(DescriptorBuildError::NoRecognizableContent(
                path.to_path_buf(),
            ));
        }

        debug!(
            pack = %root_name,
            earth_nav_data = content.earth_nav_data.is_some(),
            airport_file = content.airport_file.is_some(),
            library = content.has_library_txt,
            plugins = content.has_plugins,
            "Built pack descriptor"
        );

        let mut descriptor = PackDescriptor::new(path, content);
        descriptor.structural_warning = warning;
        Ok(descriptor)
    }
}

/// List non-hidden entries of a directory, sorted by name.
fn list_visible(dir: &Path) -> Result<Vec<Entry>, DescriptorBuildError> {
    let read = fs::read_dir(dir).map_err(|e| DescriptorBuildError::Unreadable {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut entries: Vec<Entry> = read
        .flatten()
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with('.') {
                return None;
            }
            let path = entry.path();
            // is_dir follows symlinks, which is what X-Plane does too
            let is_dir = path.is_dir();
            Some(Entry { name, path, is_dir })
        })
        .collect();

    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

/// Return the inner directory if the root holds nothing but a copy of itself.
fn nested_duplicate(root_name: &str, entries: &[Entry]) -> Option<PathBuf> {
    match entries {
        [only] if only.is_dir && names_similar(root_name, &only.name) => Some(only.path.clone()),
        _ => None,
    }
}

/// Lower-case alphanumerics only, so `KSEA Demo` and `ksea_demo` compare equal.
fn normalise_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Whether two directory names denote the same pack.
fn names_similar(a: &str, b: &str) -> bool {
    let a = normalise_name(a);
    let b = normalise_name(b);
    if a.is_empty() || b.is_empty() {
        return false;
    }
    if a == b {
        return true;
    }
    let (short, long) = if a.len() <= b.len() { (&a, &b) } else { (&b, &a) };
    short.len() >= MIN_PREFIX_SIMILARITY_LEN && long.starts_with(short.as_str())
}

/// Record the well-known entries of a content root.
fn inspect_layout(content_root: PathBuf, entries: &[Entry]) -> ContentLayout {
    let mut layout = ContentLayout {
        content_root,
        ..Default::default()
    };

    for entry in entries {
        let lower = entry.name.to_lowercase();
        match (lower.as_str(), entry.is_dir) {
            ("earth nav data", true) => {
                layout.airport_file = find_airport_file(&entry.path);
                layout.earth_nav_data = Some(entry.path.clone());
            }
            ("plugins", true) => layout.has_plugins = true,
            ("textures", true) => layout.has_textures = true,
            ("terrain", true) => layout.has_terrain = true,
            ("objects", true) => layout.has_objects = true,
            ("library.txt", false) => layout.has_library_txt = true,
            _ => {}
        }
    }

    layout
}

/// Locate `apt.dat` (preferred) or `apt.dat.gz` inside `Earth nav data/`.
fn find_airport_file(earth_nav_data: &Path) -> Option<PathBuf> {
    let entries = list_visible(earth_nav_data).ok()?;

    let lookup = |wanted: &str| {
        entries
            .iter()
            .find(|e| !e.is_dir && e.name.eq_ignore_ascii_case(wanted))
            .map(|e| e.path.clone())
    };

    lookup(AIRPORT_FILE).or_else(|| lookup(AIRPORT_FILE_GZ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_airport_pack(root: &Path, name: &str) -> PathBuf {
        let pack = root.join(name);
        let end = pack.join(EARTH_NAV_DATA);
        fs::create_dir_all(&end).unwrap();
        fs::write(end.join(AIRPORT_FILE), "I\n1100 Version\n\n1 433 0 0 KSEA Seattle\n99\n")
            .unwrap();
        pack
    }

    #[test]
    fn test_build_airport_pack() {
        let temp = TempDir::new().unwrap();
        let pack = make_airport_pack(temp.path(), "KSEA_Demo");

        let desc = DescriptorBuilder::new().build(&pack).unwrap();

        assert_eq!(desc.display_name, "KSEA_Demo");
        assert_eq!(desc.path, pack);
        assert!(desc.content.earth_nav_data.is_some());
        assert_eq!(
            desc.content.airport_file,
            Some(pack.join(EARTH_NAV_DATA).join(AIRPORT_FILE))
        );
        assert!(desc.structural_warning.is_none());
        assert!(desc.tier.is_none());
    }

    #[test]
    fn test_case_variant_folder_names() {
        let temp = TempDir::new().unwrap();
        let pack = temp.path().join("Odd_Case");
        let end = pack.join("EARTH NAV DATA");
        fs::create_dir_all(&end).unwrap();
        fs::write(end.join("APT.DAT"), "I\n").unwrap();
        fs::create_dir_all(pack.join("Textures")).unwrap();
        fs::create_dir_all(pack.join("TERRAIN")).unwrap();

        let desc = DescriptorBuilder::new().build(&pack).unwrap();

        assert_eq!(desc.content.earth_nav_data, Some(end.clone()));
        assert_eq!(desc.content.airport_file, Some(end.join("APT.DAT")));
        assert!(desc.content.has_ortho_layout());
    }

    #[test]
    fn test_gzip_airport_file_detected() {
        let temp = TempDir::new().unwrap();
        let pack = temp.path().join("Gz_Airport");
        let end = pack.join(EARTH_NAV_DATA);
        fs::create_dir_all(&end).unwrap();
        fs::write(end.join(AIRPORT_FILE_GZ), [0x1f, 0x8b]).unwrap();

        let desc = DescriptorBuilder::new().build(&pack).unwrap();
        assert_eq!(desc.content.airport_file, Some(end.join(AIRPORT_FILE_GZ)));
    }

    #[test]
    fn test_folder_in_folder_keeps_outer_path() {
        let temp = TempDir::new().unwrap();
        let outer = temp.path().join("KSEA_Demo");
        make_airport_pack(&outer, "KSEA_Demo");

        let desc = DescriptorBuilder::new().build(&outer).unwrap();

        assert_eq!(desc.path, outer);
        assert_eq!(desc.display_name, "KSEA_Demo");
        assert_eq!(
            desc.structural_warning,
            Some(StructuralWarning::NestedDuplicate {
                inner: outer.join("KSEA_Demo")
            })
        );
        // Content is read from the inner copy so classification still works
        assert!(desc.content.airport_file.is_some());
        assert_eq!(desc.content.content_root, outer.join("KSEA_Demo"));
    }

    #[test]
    fn test_folder_in_folder_similar_name() {
        let temp = TempDir::new().unwrap();
        let outer = temp.path().join("KSEA Demo v2");
        make_airport_pack(&outer, "ksea_demo");

        let desc = DescriptorBuilder::new().build(&outer).unwrap();
        assert!(desc.structural_warning.is_some());
    }

    #[test]
    fn test_single_unrelated_subfolder_is_not_nested() {
        let temp = TempDir::new().unwrap();
        let pack = temp.path().join("Some_Library");
        fs::create_dir_all(pack.join("objects")).unwrap();

        let desc = DescriptorBuilder::new().build(&pack).unwrap();
        assert!(desc.structural_warning.is_none());
        assert!(desc.content.has_objects);
    }

    #[test]
    fn test_empty_pack_fails() {
        let temp = TempDir::new().unwrap();
        let pack = temp.path().join("Empty");
        fs::create_dir_all(&pack).unwrap();
        fs::write(pack.join(".DS_Store"), "").unwrap();

        let err = DescriptorBuilder::new().build(&pack).unwrap_err();
        assert!(matches!(err, DescriptorBuildError::Empty(_)));
    }

    #[test]
    fn test_unrecognizable_pack_fails() {
        let temp = TempDir::new().unwrap();
        let pack = temp.path().join("Docs_Only");
        fs::create_dir_all(&pack).unwrap();
        fs::write(pack.join("readme.txt"), "hello").unwrap();

        let err = DescriptorBuilder::new().build(&pack).unwrap_err();
        assert!(matches!(err, DescriptorBuildError::NoRecognizableContent(_)));
    }

    #[test]
    fn test_missing_pack_is_unreadable() {
        let temp = TempDir::new().unwrap();
        let err = DescriptorBuilder::new()
            .build(&temp.path().join("gone"))
            .unwrap_err();
        assert!(matches!(err, DescriptorBuildError::Unreadable { .. }));
    }

    #[test]
    fn test_names_similar() {
        assert!(names_similar("KSEA_Demo", "KSEA Demo"));
        assert!(names_similar("KSEA_Demo", "ksea_demo_v1.2"));
        assert!(!names_similar("abc", "abcdef"));
        assert!(!names_similar("objects", "KSEA"));
        assert!(!names_similar("___", "___"));
    }
}
