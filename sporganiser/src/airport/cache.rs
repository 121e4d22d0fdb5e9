//! Persistent airport data cache.
//!
//! Parsing `apt.dat` and probing DSF tiles is the slow part of a run, so the
//! results are stored keyed by a content [`Fingerprint`]. A fingerprint
//! changes whenever the pack's path or the modification metadata of its
//! airport data changes, which makes stale entries unreachable rather than
//! wrong. Stale entries are dropped when the cache is saved.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::fs;
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::SystemTime;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::pack::{AirportId, PackDescriptor, TierHints};

/// Bumped whenever the on-disk layout or the meaning of an entry changes.
pub const CACHE_FORMAT_VERSION: u32 = 1;

/// Default cache file name inside the application directory.
pub const CACHE_FILE_NAME: &str = "airport_cache.bin";

/// Content fingerprint of a pack's airport data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Fingerprint a descriptor from its path and modification metadata.
    ///
    /// Inputs: the pack path, the root's mtime, and mtime + length of both
    /// `Earth nav data/` and the airport file. Missing entries hash as zero.
    pub fn of(descriptor: &PackDescriptor) -> Self {
        let mut hasher = Sha256::new();

        hasher.update(descriptor.path.to_string_lossy().as_bytes());
        hasher.update([0u8]);
        hasher.update(descriptor.content.content_root.to_string_lossy().as_bytes());
        hasher.update([0u8]);

        let (root_mtime, _) = stat(Some(&descriptor.path));
        hasher.update(root_mtime.to_le_bytes());

        for entry in [
            descriptor.content.earth_nav_data.as_deref(),
            descriptor.content.airport_file.as_deref(),
        ] {
            let (mtime, len) = stat(entry);
            hasher.update(mtime.to_le_bytes());
            hasher.update(len.to_le_bytes());
        }

        Self(hasher.finalize().into())
    }

    /// Lower-case hex form, for logs.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The first 12 hex digits are plenty to tell entries apart in logs
        write!(f, "{}", &self.to_hex()[..12])
    }
}

/// Modification time in nanoseconds since the epoch, and length.
fn stat(path: Option<&Path>) -> (u128, u64) {
    let Some(meta) = path.and_then(|p| fs::metadata(p).ok()) else {
        return (0, 0);
    };
    let mtime = meta
        .modified()
        .ok()
        .and_then(|t| t.duration_since(SystemTime::UNIX_EPOCH).ok())
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    (mtime, meta.len())
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// One cached extraction result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Pack path the entry was computed for.
    pub path: PathBuf,

    /// Identifiers found in the airport file.
    pub airport_ids: BTreeSet<AirportId>,

    /// Content hints for the classifier.
    pub hints: TierHints,

    /// When the entry was created (secs since UNIX_EPOCH).
    pub created_at_secs: u64,
}

impl CacheEntry {
    /// Create an entry stamped with the current time.
    pub fn new(path: impl Into<PathBuf>, airport_ids: BTreeSet<AirportId>, hints: TierHints) -> Self {
        Self {
            path: path.into(),
            airport_ids,
            hints,
            created_at_secs: now_secs(),
        }
    }
}

/// Serialized cache file.
#[derive(Debug, Serialize, Deserialize)]
pub struct CacheFile {
    /// Layout version, see [`CACHE_FORMAT_VERSION`].
    pub version: u32,

    /// When the file was written (secs since UNIX_EPOCH).
    pub saved_at_secs: u64,

    /// Cached entries.
    pub entries: Vec<(Fingerprint, CacheEntry)>,
}

impl CacheFile {
    /// Read a cache file without validating or pruning it.
    pub fn load(path: &Path) -> io::Result<Self> {
        let file = fs::File::open(path)?;
        let reader = BufReader::new(file);

        bincode::deserialize_from(reader).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Failed to deserialize airport cache: {}", e),
            )
        })
    }

    /// Write to `path` through a temp file and rename.
    pub fn save(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = path.with_extension("tmp");
        {
            let file = fs::File::create(&temp_path)?;
            let writer = BufWriter::new(file);
            bincode::serialize_into(writer, self).map_err(|e| {
                io::Error::other(format!("Failed to serialize airport cache: {}", e))
            })?;
        }

        fs::rename(&temp_path, path)
    }

    /// Seconds since the file was written.
    pub fn age_secs(&self) -> u64 {
        now_secs().saturating_sub(self.saved_at_secs)
    }

    /// Human-readable age.
    pub fn age_human(&self) -> String {
        age_human(self.age_secs())
    }
}

fn age_human(secs: u64) -> String {
    if secs < 60 {
        format!("{}s ago", secs)
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else if secs < 86400 {
        format!("{}h ago", secs / 3600)
    } else {
        format!("{}d ago", secs / 86400)
    }
}

/// Hit/miss counters for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: usize,
    pub misses: usize,
}

/// Concurrent airport cache shared by the extraction workers.
///
/// Readers never block each other; writers only contend on the shard of
/// their own fingerprint.
#[derive(Debug, Default)]
pub struct AirportCache {
    file: Option<PathBuf>,
    entries: DashMap<Fingerprint, CacheEntry>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl AirportCache {
    /// A cache that is never persisted.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load the cache from `path`.
    ///
    /// Never fails: a missing, corrupt or outdated file gives an empty cache.
    /// Entries whose pack no longer exists are dropped.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let cache = Self {
            file: Some(path.clone()),
            ..Self::default()
        };

        let file = match CacheFile::load(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No airport cache, starting cold");
                return cache;
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring unreadable airport cache");
                return cache;
            }
        };

        if file.version != CACHE_FORMAT_VERSION {
            info!(
                found = file.version,
                expected = CACHE_FORMAT_VERSION,
                "Airport cache format changed, starting cold"
            );
            return cache;
        }

        let total = file.entries.len();
        for (fingerprint, entry) in file.entries {
            if entry.path.exists() {
                cache.entries.insert(fingerprint, entry);
            }
        }

        debug!(
            path = %path.display(),
            age = %age_human(now_secs().saturating_sub(file.saved_at_secs)),
            loaded = cache.entries.len(),
            pruned = total - cache.entries.len(),
            "Loaded airport cache"
        );

        cache
    }

    /// Backing file, if persisted.
    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    /// Look up an entry, counting the hit or miss.
    pub fn get(&self, fingerprint: &Fingerprint) -> Option<CacheEntry> {
        match self.entries.get(fingerprint) {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.value().clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Insert or replace an entry.
    pub fn insert(&self, fingerprint: Fingerprint, entry: CacheEntry) {
        self.entries.insert(fingerprint, entry);
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Persist the cache, keeping only the newest entry per pack path.
    ///
    /// No-op for an in-memory cache.
    pub fn save(&self) -> io::Result<()> {
        let Some(path) = &self.file else {
            return Ok(());
        };

        let mut newest: HashMap<PathBuf, (Fingerprint, CacheEntry)> = HashMap::new();
        for item in self.entries.iter() {
            let (fingerprint, entry) = (*item.key(), item.value().clone());
            let replace = newest
                .get(&entry.path)
                .map_or(true, |(_, kept)| kept.created_at_secs <= entry.created_at_secs);
            if replace {
                newest.insert(entry.path.clone(), (fingerprint, entry));
            }
        }

        let mut entries: Vec<_> = newest.into_values().collect();
        entries.sort_by(|a, b| a.1.path.cmp(&b.1.path));

        let file = CacheFile {
            version: CACHE_FORMAT_VERSION,
            saved_at_secs: now_secs(),
            entries,
        };
        file.save(path)?;

        info!(
            path = %path.display(),
            entries = file.entries.len(),
            "Saved airport cache"
        );
        Ok(())
    }

    /// Delete a cache file. Returns whether a file was removed.
    pub fn clear(path: &Path) -> io::Result<bool> {
        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Default cache file path: `~/.sporganiser/airport_cache.bin`.
pub fn default_cache_path() -> PathBuf {
    crate::config::config_directory().join(CACHE_FILE_NAME)
}
