//! Cache-backed airport data extraction.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, warn};

use super::cache::{AirportCache, CacheEntry, Fingerprint};
use super::error::ExtractionParseError;
use super::parser::AptDatParser;
use crate::dsf;
use crate::pack::{AirportId, PackDescriptor, TierHints};

/// Result of extracting one pack.
#[derive(Debug)]
pub struct Extraction {
    /// Identifiers declared by the pack, possibly empty.
    pub airport_ids: BTreeSet<AirportId>,

    /// Content hints for the classifier.
    pub hints: TierHints,

    /// Set when the airport file was present but malformed.
    pub error: Option<ExtractionParseError>,

    /// Whether the result came from the cache.
    pub cached: bool,
}

/// Extracts airport identifiers and tier hints, consulting the cache first.
///
/// Safe to share between worker threads.
#[derive(Debug, Clone)]
pub struct AirportExtractor {
    cache: Arc<AirportCache>,
}

impl AirportExtractor {
    /// Create an extractor over a shared cache.
    pub fn new(cache: Arc<AirportCache>) -> Self {
        Self { cache }
    }

    /// The backing cache.
    pub fn cache(&self) -> &Arc<AirportCache> {
        &self.cache
    }

    /// Extract a pack's airport data.
    ///
    /// Never fails: a malformed airport file yields an empty identifier set
    /// and the error in [`Extraction::error`]. Only successful extractions
    /// are cached.
    pub fn extract(&self, descriptor: &PackDescriptor) -> Extraction {
        let fingerprint = Fingerprint::of(descriptor);

        if let Some(entry) = self.cache.get(&fingerprint) {
            debug!(
                pack = %descriptor.display_name,
                %fingerprint,
                airports = entry.airport_ids.len(),
                "Airport cache hit"
            );
            return Extraction {
                airport_ids: entry.airport_ids,
                hints: entry.hints,
                error: None,
                cached: true,
            };
        }

        let (airport_ids, error) = match &descriptor.content.airport_file {
            Some(file) => match AptDatParser::parse_file(file) {
                Ok(ids) => (ids, None),
                Err(e) => {
                    warn!(pack = %descriptor.display_name, error = %e, "Skipping malformed airport file");
                    (BTreeSet::new(), Some(e))
                }
            },
            None => (BTreeSet::new(), None),
        };

        let hints = if airport_ids.is_empty() {
            probe_hints(descriptor)
        } else {
            TierHints::default()
        };

        if error.is_none() {
            self.cache.insert(
                fingerprint,
                CacheEntry::new(&descriptor.path, airport_ids.clone(), hints),
            );
        }

        debug!(
            pack = %descriptor.display_name,
            %fingerprint,
            airports = airport_ids.len(),
            dsf_overlay = ?hints.dsf_overlay,
            "Extracted airport data"
        );

        Extraction {
            airport_ids,
            hints,
            error,
            cached: false,
        }
    }
}

fn probe_hints(descriptor: &PackDescriptor) -> TierHints {
    let Some(end) = &descriptor.content.earth_nav_data else {
        return TierHints::default();
    };

    let dsf_overlay = match dsf::probe_overlay(end) {
        Ok(overlay) => Some(overlay),
        Err(e) => {
            debug!(pack = %descriptor.display_name, error = %e, "No DSF hint");
            None
        }
    };

    TierHints { dsf_overlay }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pack::{DescriptorBuilder, AIRPORT_FILE, EARTH_NAV_DATA};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn pack_with(root: &Path, name: &str, apt: Option<&[u8]>) -> PackDescriptor {
        let pack = root.join(name);
        let end = pack.join(EARTH_NAV_DATA);
        fs::create_dir_all(&end).unwrap();
        if let Some(apt) = apt {
            fs::write(end.join(AIRPORT_FILE), apt).unwrap();
        }
        DescriptorBuilder::new().build(&pack).unwrap()
    }

    #[test]
    fn test_extract_then_hit_cache() {
        let temp = TempDir::new().unwrap();
        let desc = pack_with(temp.path(), "KSEA", Some(b"I\n1000 V\n1 0 0 0 KSEA x\n"));
        let extractor = AirportExtractor::new(Arc::new(AirportCache::in_memory()));

        let first = extractor.extract(&desc);
        assert!(!first.cached);
        assert_eq!(first.airport_ids.len(), 1);

        let second = extractor.extract(&desc);
        assert!(second.cached);
        assert_eq!(second.airport_ids, first.airport_ids);
        assert_eq!(extractor.cache().stats().hits, 1);
    }

    #[test]
    fn test_malformed_file_is_non_fatal_and_not_cached() {
        let temp = TempDir::new().unwrap();
        let desc = pack_with(temp.path(), "Broken", Some(b"PK\x03\x04zipdata"));
        let extractor = AirportExtractor::new(Arc::new(AirportCache::in_memory()));

        let result = extractor.extract(&desc);
        assert!(result.airport_ids.is_empty());
        assert!(matches!(
            result.error,
            Some(ExtractionParseError::ForeignFormat { format: "Zip", .. })
        ));
        assert!(extractor.cache().is_empty());
    }

    #[test]
    fn test_dsf_hint_for_non_airport_pack() {
        let temp = TempDir::new().unwrap();
        let desc = pack_with(temp.path(), "Some_Overlay", None);
        let tile = desc.content.earth_nav_data.clone().unwrap().join("+40-080");
        fs::create_dir_all(&tile).unwrap();
        fs::write(
            tile.join("+47-123.dsf"),
            dsf::build_dsf(b"sim/overlay\x001\0", &[]),
        )
        .unwrap();

        let extractor = AirportExtractor::new(Arc::new(AirportCache::in_memory()));
        let result = extractor.extract(&desc);

        assert!(result.airport_ids.is_empty());
        assert_eq!(result.hints.dsf_overlay, Some(true));
    }

    #[test]
    fn test_changed_file_misses_cache() {
        let temp = TempDir::new().unwrap();
        let desc = pack_with(temp.path(), "KSEA", Some(b"I\n1 0 0 0 KSEA x\n"));
        let extractor = AirportExtractor::new(Arc::new(AirportCache::in_memory()));
        extractor.extract(&desc);

        let apt = desc.content.airport_file.clone().unwrap();
        fs::write(&apt, b"I\n1 0 0 0 KSEA x\n1 0 0 0 KBFI y\n").unwrap();
        filetime::set_file_mtime(&apt, filetime::FileTime::from_unix_time(2_000_000, 0)).unwrap();

        let result = extractor.extract(&desc);
        assert!(!result.cached);
        assert_eq!(result.airport_ids.len(), 2);
    }
}
