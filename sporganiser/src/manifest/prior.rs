//! The manifest left by a previous run.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::format::{self, CUSTOM_SCENERY_DIR, MANIFEST_FILE, UNSORTED_FILE};

/// One pack line of the previous manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorEntry {
    /// Canonical path when the target still exists, otherwise as written.
    pub path: PathBuf,
    pub enabled: bool,
    /// Target text exactly as it appeared in the file.
    pub target: String,
}

/// Enabled/disabled state recorded by a previous run.
#[derive(Debug, Clone, Default)]
pub struct PriorManifest {
    entries: Vec<PriorEntry>,
    by_path: HashMap<PathBuf, bool>,
    global_airports: Option<bool>,
}

impl PriorManifest {
    /// No prior state.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Read `Custom Scenery/scenery_packs.ini` under an X-Plane install.
    ///
    /// A missing manifest is an empty prior. Packs that the previous run
    /// disabled only because they were unclassifiable (listed disabled in
    /// `scenery_packs_unsorted.ini`) are not carried over.
    pub fn load(install_dir: &Path) -> io::Result<Self> {
        let scenery_dir = install_dir.join(CUSTOM_SCENERY_DIR);

        let text = match fs::read_to_string(scenery_dir.join(MANIFEST_FILE)) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(dir = %scenery_dir.display(), "No previous scenery_packs.ini");
                return Ok(Self::empty());
            }
            Err(e) => return Err(e),
        };

        let excluded: HashSet<PathBuf> = match fs::read_to_string(scenery_dir.join(UNSORTED_FILE)) {
            Ok(unsorted) => format::parse(&unsorted)
                .into_iter()
                .filter(|line| !line.enabled)
                .map(|line| canonical_or_raw(format::target_path(&line.target, install_dir)))
                .collect(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => HashSet::new(),
            Err(e) => return Err(e),
        };

        let prior = Self::from_text(&text, install_dir, &excluded);
        info!(
            entries = prior.len(),
            disabled = prior.disabled_count(),
            excluded = excluded.len(),
            "Loaded previous scenery_packs.ini"
        );
        Ok(prior)
    }

    /// Build from manifest text, skipping paths in `excluded`.
    pub fn from_text(text: &str, install_dir: &Path, excluded: &HashSet<PathBuf>) -> Self {
        let mut prior = Self::default();

        for line in format::parse(text) {
            if line.is_global_airports() {
                prior.global_airports = Some(line.enabled);
                continue;
            }

            let path = canonical_or_raw(format::target_path(&line.target, install_dir));
            if excluded.contains(&path) {
                continue;
            }
            // First occurrence wins, as it does for X-Plane
            if prior.by_path.contains_key(&path) {
                continue;
            }

            prior.by_path.insert(path.clone(), line.enabled);
            prior.entries.push(PriorEntry {
                path,
                enabled: line.enabled,
                target: line.target,
            });
        }

        prior
    }

    /// Recorded state of a pack, if it was listed.
    pub fn enabled(&self, path: &Path) -> Option<bool> {
        self.by_path.get(path).copied()
    }

    /// Recorded state of the `*GLOBAL_AIRPORTS*` line.
    pub fn global_airports(&self) -> Option<bool> {
        self.global_airports
    }

    pub fn entries(&self) -> &[PriorEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn disabled_count(&self) -> usize {
        self.entries.iter().filter(|e| !e.enabled).count()
    }

    /// Entries whose pack is not among `present`.
    pub fn missing<'a>(&'a self, present: &HashSet<&Path>) -> Vec<&'a PriorEntry> {
        self.entries
            .iter()
            .filter(|e| !present.contains(e.path.as_path()))
            .collect()
    }
}

fn canonical_or_raw(path: PathBuf) -> PathBuf {
    fs::canonicalize(&path).unwrap_or(path)
}
