//! Atomic manifest writer with backup rotation.
//!
//! Sequence for `scenery_packs.ini`:
//!
//! 1. Write `scenery_packs.ini.tmp` and fsync it
//! 2. Preserve the current manifest as `scenery_packs.ini.<YYYYmmddHHMMSS>.bak`
//!    (hard link, falling back to a copy)
//! 3. Rename the temp file over the manifest
//! 4. Delete older `scenery_packs.ini*.bak` files
//!
//! Until step 3 completes the previous manifest is untouched, so a crash
//! never leaves X-Plane with a half-written file.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::format::{CUSTOM_SCENERY_DIR, MANIFEST_FILE, UNSORTED_FILE};
use super::merge::FinalManifest;

/// Backup file suffix.
pub const BACKUP_EXTENSION: &str = "bak";

/// Failure to persist the manifest. Fatal for the run.
#[derive(Debug, Error)]
pub enum ManifestWriteError {
    #[error("Custom Scenery folder not found: {0}")]
    MissingSceneryDir(PathBuf),

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ManifestWriteError {
    fn io(path: &Path) -> impl FnOnce(io::Error) -> Self + '_ {
        move |source| Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// What a write did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOutcome {
    pub manifest_path: PathBuf,
    pub unsorted_path: PathBuf,
    /// Backup of the previous manifest, if one existed.
    pub backup_path: Option<PathBuf>,
    pub pruned_backups: Vec<PathBuf>,
    pub entries: usize,
}

/// Writes `scenery_packs.ini` and `scenery_packs_unsorted.ini`.
#[derive(Debug, Clone)]
pub struct ManifestWriter {
    scenery_dir: PathBuf,
}

impl ManifestWriter {
    /// Writer for the `Custom Scenery` folder of an X-Plane install.
    pub fn new(install_dir: &Path) -> Self {
        Self::for_scenery_dir(install_dir.join(CUSTOM_SCENERY_DIR))
    }

    pub fn for_scenery_dir(scenery_dir: impl Into<PathBuf>) -> Self {
        Self {
            scenery_dir: scenery_dir.into(),
        }
    }

    pub fn scenery_dir(&self) -> &Path {
        &self.scenery_dir
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.scenery_dir.join(MANIFEST_FILE)
    }

    pub fn unsorted_path(&self) -> PathBuf {
        self.scenery_dir.join(UNSORTED_FILE)
    }

    /// The `scenery_packs.ini` text [`write`](Self::write) would produce.
    pub fn preview(&self, manifest: &FinalManifest) -> String {
        manifest.render(&self.canonical_scenery_dir())
    }

    // Pack paths are canonical, so targets only come out relative when
    // computed against the canonical folder.
    fn canonical_scenery_dir(&self) -> PathBuf {
        fs::canonicalize(&self.scenery_dir).unwrap_or_else(|_| self.scenery_dir.clone())
    }

    /// Persist the manifest.
    ///
    /// # Errors
    ///
    /// Any I/O failure before the final rename leaves the previous manifest
    /// intact. Failing to prune old backups only logs a warning.
    pub fn write(&self, manifest: &FinalManifest) -> Result<WriteOutcome, ManifestWriteError> {
        if !self.scenery_dir.is_dir() {
            return Err(ManifestWriteError::MissingSceneryDir(
                self.scenery_dir.clone(),
            ));
        }

        let canonical_dir = self.canonical_scenery_dir();

        let manifest_path = self.manifest_path();
        let text = manifest.render(&canonical_dir);

        let temp_path = with_suffix(&manifest_path, "tmp");
        write_synced(&temp_path, &text)?;

        // Unsorted list before the swap; a failure here keeps the old manifest
        let unsorted_path = self.unsorted_path();
        if let Err(e) = self.write_unsorted(manifest, &canonical_dir, &unsorted_path) {
            let _ = fs::remove_file(&temp_path);
            return Err(e);
        }

        let backup_path = if manifest_path.exists() {
            match self.backup(&manifest_path) {
                Ok(path) => Some(path),
                Err(e) => {
                    let _ = fs::remove_file(&temp_path);
                    return Err(e);
                }
            }
        } else {
            None
        };

        fs::rename(&temp_path, &manifest_path).map_err(ManifestWriteError::io(&manifest_path))?;
        info!(
            path = %manifest_path.display(),
            entries = manifest.len(),
            enabled = manifest.enabled_count(),
            "Wrote scenery_packs.ini"
        );

        let pruned_backups = self.prune_backups(backup_path.as_deref());

        Ok(WriteOutcome {
            manifest_path,
            unsorted_path,
            backup_path,
            pruned_backups,
            entries: manifest.len(),
        })
    }

    fn write_unsorted(
        &self,
        manifest: &FinalManifest,
        canonical_dir: &Path,
        unsorted_path: &Path,
    ) -> Result<(), ManifestWriteError> {
        let unsorted_temp = with_suffix(unsorted_path, "tmp");
        write_synced(&unsorted_temp, &manifest.render_unsorted(canonical_dir))?;
        if let Err(e) = fs::rename(&unsorted_temp, unsorted_path) {
            let _ = fs::remove_file(&unsorted_temp);
            return Err(ManifestWriteError::io(unsorted_path)(e));
        }
        debug!(path = %unsorted_path.display(), "Wrote unsorted pack list");
        Ok(())
    }

    /// Preserve the current manifest under a timestamped name.
    fn backup(&self, manifest_path: &Path) -> Result<PathBuf, ManifestWriteError> {
        let stamp = Local::now().format("%Y%m%d%H%M%S").to_string();
        let mut backup = with_suffix(manifest_path, &format!("{}.{}", stamp, BACKUP_EXTENSION));
        let mut n = 1;
        while backup.exists() {
            backup = with_suffix(
                manifest_path,
                &format!("{}-{}.{}", stamp, n, BACKUP_EXTENSION),
            );
            n += 1;
        }

        if let Err(e) = fs::hard_link(manifest_path, &backup) {
            debug!(error = %e, "Hard link failed, copying manifest backup");
            fs::copy(manifest_path, &backup).map_err(ManifestWriteError::io(&backup))?;
        }

        debug!(backup = %backup.display(), "Backed up previous scenery_packs.ini");
        Ok(backup)
    }

    /// Delete every manifest backup except `keep`.
    fn prune_backups(&self, keep: Option<&Path>) -> Vec<PathBuf> {
        let pattern = format!(
            "{}/{}*.{}",
            glob::Pattern::escape(&self.scenery_dir.to_string_lossy()),
            MANIFEST_FILE,
            BACKUP_EXTENSION
        );

        let paths = match glob::glob(&pattern) {
            Ok(paths) => paths,
            Err(e) => {
                warn!(error = %e, "Invalid backup pattern");
                return Vec::new();
            }
        };

        let mut pruned = Vec::new();
        for path in paths.flatten() {
            if Some(path.as_path()) == keep {
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => pruned.push(path),
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to prune backup"),
            }
        }

        if !pruned.is_empty() {
            debug!(count = pruned.len(), "Pruned old manifest backups");
        }
        pruned
    }
}

/// `name` -> `name.<suffix>` (keeps the existing extension).
fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

fn write_synced(path: &Path, text: &str) -> Result<(), ManifestWriteError> {
    let mut file = File::create(path).map_err(ManifestWriteError::io(path))?;
    file.write_all(text.as_bytes())
        .map_err(ManifestWriteError::io(path))?;
    file.sync_all().map_err(ManifestWriteError::io(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{MergeEngine, MergeOptions, PriorManifest, UnclassifiedPolicy};
    use crate::pack::{ContentLayout, PackDescriptor, Tier};
    use tempfile::TempDir;

    fn manifest_for(scenery: &Path, names: &[&str]) -> FinalManifest {
        let descriptors: Vec<PackDescriptor> = names
            .iter()
            .map(|n| {
                PackDescriptor::new(scenery.join(n), ContentLayout::default())
                    .with_tier(Tier::SceneryLibrary)
            })
            .collect();
        MergeEngine::new().merge(
            &descriptors,
            &[],
            &PriorManifest::empty(),
            &MergeOptions::new(UnclassifiedPolicy::Disable),
        )
    }

    fn setup() -> (TempDir, ManifestWriter) {
        let temp = TempDir::new().unwrap();
        let install = fs::canonicalize(temp.path()).unwrap();
        fs::create_dir_all(install.join(CUSTOM_SCENERY_DIR)).unwrap();
        let writer = ManifestWriter::new(&install);
        (temp, writer)
    }

    fn backups(dir: &Path) -> Vec<PathBuf> {
        let mut found: Vec<PathBuf> = fs::read_dir(dir)
            .unwrap()
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|e| e == BACKUP_EXTENSION))
            .collect();
        found.sort();
        found
    }

    #[test]
    fn test_first_write_has_no_backup() {
        let (_temp, writer) = setup();
        let manifest = manifest_for(writer.scenery_dir(), &["Lib"]);

        let outcome = writer.write(&manifest).unwrap();

        assert!(outcome.backup_path.is_none());
        let text = fs::read_to_string(&outcome.manifest_path).unwrap();
        assert_eq!(text, "I\n1000 Version\nSCENERY\n\nSCENERY_PACK Custom Scenery/Lib/\n");
        assert!(outcome.unsorted_path.exists());
        assert!(!with_suffix(&outcome.manifest_path, "tmp").exists());
    }

    #[test]
    fn test_backup_preserves_previous_content() {
        let (_temp, writer) = setup();
        fs::write(writer.manifest_path(), "old content\n").unwrap();

        let outcome = writer
            .write(&manifest_for(writer.scenery_dir(), &["Lib"]))
            .unwrap();

        let backup = outcome.backup_path.unwrap();
        assert_eq!(fs::read_to_string(&backup).unwrap(), "old content\n");
        assert!(fs::read_to_string(&outcome.manifest_path)
            .unwrap()
            .contains("SCENERY_PACK Custom Scenery/Lib/"));
    }

    #[test]
    fn test_old_backups_pruned() {
        let (_temp, writer) = setup();
        let stale = with_suffix(&writer.manifest_path(), "20200101000000.bak");
        fs::write(&stale, "ancient").unwrap();
        fs::write(writer.manifest_path(), "previous").unwrap();

        let outcome = writer
            .write(&manifest_for(writer.scenery_dir(), &["Lib"]))
            .unwrap();

        assert_eq!(outcome.pruned_backups, vec![stale.clone()]);
        assert!(!stale.exists());
        assert_eq!(backups(writer.scenery_dir()), vec![outcome.backup_path.unwrap()]);
    }

    #[test]
    fn test_repeated_writes_keep_one_backup() {
        let (_temp, writer) = setup();
        let manifest = manifest_for(writer.scenery_dir(), &["A", "B"]);

        writer.write(&manifest).unwrap();
        writer.write(&manifest).unwrap();
        writer.write(&manifest).unwrap();

        assert_eq!(backups(writer.scenery_dir()).len(), 1);
    }

    #[test]
    fn test_preview_matches_written_file() {
        let (_temp, writer) = setup();
        let manifest = manifest_for(writer.scenery_dir(), &["Lib"]);

        let preview = writer.preview(&manifest);
        let outcome = writer.write(&manifest).unwrap();

        assert_eq!(fs::read_to_string(outcome.manifest_path).unwrap(), preview);
        assert!(preview.contains("SCENERY_PACK Custom Scenery/Lib/\n"));
    }

    #[test]
    fn test_unsorted_failure_keeps_previous_manifest() {
        let (_temp, writer) = setup();
        fs::write(writer.manifest_path(), "old content\n").unwrap();
        let blocker = writer.unsorted_path();
        fs::create_dir_all(blocker.join("occupied")).unwrap();

        let manifest = manifest_for(writer.scenery_dir(), &["Lib"]);
        assert!(writer.write(&manifest).is_err());

        assert_eq!(fs::read_to_string(writer.manifest_path()).unwrap(), "old content\n");
        assert!(backups(writer.scenery_dir()).is_empty());
        assert!(!with_suffix(&writer.manifest_path(), "tmp").exists());
        assert!(!with_suffix(&blocker, "tmp").exists());
    }

    #[test]
    fn test_missing_scenery_dir() {
        let temp = TempDir::new().unwrap();
        let writer = ManifestWriter::new(temp.path());

        let err = writer.write(&FinalManifest::default()).unwrap_err();
        assert!(matches!(err, ManifestWriteError::MissingSceneryDir(_)));
    }

    #[test]
    fn test_with_suffix() {
        assert_eq!(
            with_suffix(Path::new("/a/scenery_packs.ini"), "tmp"),
            PathBuf::from("/a/scenery_packs.ini.tmp")
        );
    }
}
