//! The organiser: scan, finalize, write.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use super::config::OrganiserConfig;
use super::error::{OrganiserError, OrganiserResult};
use super::progress::{ScanProgress, ScanProgressCallback};
use super::report::{PackIssue, RunReport};
use crate::airport::{AirportCache, AirportExtractor, ExtractionParseError};
use crate::classify::{ClassificationAmbiguous, RuleMatch, TierClassifier};
use crate::manifest::{
    FinalManifest, ManifestWriter, MergeEngine, MergeOptions, PriorManifest, WriteOutcome,
};
use crate::overlap::{resolve_groups, ConflictGroup, ConflictResolutions, OverlapDetector};
use crate::pack::{display_name_of, DescriptorBuildError, DescriptorBuilder, PackDescriptor};
use crate::resolve::{FsPathResolver, PathResolver};

/// Everything the caller needs before the manifest is finalized.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    /// Classified (or classification-failed) packs in listing order.
    pub descriptors: Vec<PackDescriptor>,

    /// Overlapping custom airports, in alphabetical default order.
    pub conflict_groups: Vec<ConflictGroup>,

    /// State recorded by the previous run.
    pub prior: PriorManifest,

    pub report: RunReport,
}

impl ScanOutcome {
    /// Packs no rule could classify.
    pub fn unclassified(&self) -> impl Iterator<Item = &PackDescriptor> {
        self.descriptors.iter().filter(|d| d.classification_failed)
    }

    /// Whether any conflict group awaits an ordering decision.
    pub fn has_conflicts(&self) -> bool {
        !self.conflict_groups.is_empty()
    }
}

/// Result of the per-pack phase for one root.
struct ScannedPack {
    descriptor: PackDescriptor,
    extraction_error: Option<ExtractionParseError>,
    classification: Result<RuleMatch, ClassificationAmbiguous>,
    cached: bool,
}

/// Runs the whole pipeline over one X-Plane installation.
///
/// ```ignore
/// let organiser = Organiser::new(OrganiserConfig::new(install_dir));
/// let outcome = organiser.scan()?;
/// let manifest = organiser.finalize(&outcome, &resolutions, &options)?;
/// organiser.write(&manifest)?;
/// ```
pub struct Organiser {
    config: OrganiserConfig,
    resolver: Arc<dyn PathResolver>,
    builder: DescriptorBuilder,
    extractor: AirportExtractor,
    classifier: TierClassifier,
    detector: OverlapDetector,
    merger: MergeEngine,
    progress: Option<ScanProgressCallback>,
}

impl Organiser {
    /// Create an organiser, loading the airport cache if one is configured.
    pub fn new(config: OrganiserConfig) -> Self {
        let cache = match &config.cache_file {
            Some(path) => AirportCache::load(path.clone()),
            None => AirportCache::in_memory(),
        };

        Self {
            config,
            resolver: Arc::new(FsPathResolver),
            builder: DescriptorBuilder::new(),
            extractor: AirportExtractor::new(Arc::new(cache)),
            classifier: TierClassifier::default(),
            detector: OverlapDetector::new(),
            merger: MergeEngine::new(),
            progress: None,
        }
    }

    /// Replace the path resolver.
    pub fn with_resolver(mut self, resolver: Arc<dyn PathResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Replace the classifier, e.g. with an extended rule table.
    pub fn with_classifier(mut self, classifier: TierClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Receive scan progress updates.
    pub fn with_progress(mut self, callback: ScanProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    pub fn config(&self) -> &OrganiserConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<AirportCache> {
        self.extractor.cache()
    }

    /// Writer targeting this installation.
    pub fn writer(&self) -> ManifestWriter {
        ManifestWriter::new(&self.config.install_dir)
    }

    /// List, resolve, build, extract and classify every pack, then group
    /// overlapping custom airports.
    ///
    /// Per-pack failures land in [`ScanOutcome::report`]; only a missing or
    /// unlistable `Custom Scenery` folder or an unreadable previous manifest
    /// fails the scan.
    pub fn scan(&self) -> OrganiserResult<ScanOutcome> {
        let scenery_dir = self.config.scenery_dir();
        if !scenery_dir.is_dir() {
            return Err(OrganiserError::MissingSceneryDir(scenery_dir));
        }

        self.emit(ScanProgress::discovering());
        let mut report = RunReport::default();

        let entries = list_entries(&scenery_dir)?;
        report.entries_found = entries.len();
        info!(dir = %scenery_dir.display(), entries = entries.len(), "Scanning Custom Scenery");

        let mut roots = Vec::with_capacity(entries.len());
        let mut seen = HashSet::new();
        for raw in &entries {
            match self.resolver.resolve(raw) {
                Ok(real) if seen.insert(real.clone()) => roots.push(real),
                Ok(real) => {
                    warn!(entry = %raw.display(), target = %real.display(), "Duplicate pack entry");
                    report.unresolved.push(PackIssue::new(
                        raw,
                        format!("duplicate of {}", real.display()),
                    ));
                }
                Err(e) => {
                    warn!(entry = %raw.display(), reason = %e.reason, "Unresolvable entry");
                    report.unresolved.push(PackIssue::new(raw, &e.reason));
                }
            }
        }

        let scanned = self.scan_packs(&roots)?;

        let mut descriptors = Vec::with_capacity(scanned.len());
        for result in scanned {
            match result {
                Ok(pack) => {
                    record_pack(&mut report, &pack);
                    descriptors.push(pack.descriptor);
                }
                Err(e) => {
                    warn!(path = %e.path().display(), error = %e, "Excluding pack");
                    report.build_failures.push(PackIssue::new(e.path(), &e));
                }
            }
        }

        self.emit(ScanProgress::detecting(roots.len()));
        let conflict_groups = self.detector.detect(&descriptors);

        let prior = PriorManifest::load(&self.config.install_dir).map_err(|source| {
            OrganiserError::PriorManifest {
                path: scenery_dir.clone(),
                source,
            }
        })?;
        let present: HashSet<&Path> = roots.iter().map(PathBuf::as_path).collect();
        report.missing_prior = prior
            .missing(&present)
            .into_iter()
            .map(|entry| entry.target.clone())
            .collect();

        if let Err(e) = self.cache().save() {
            warn!(error = %e, "Failed to save airport cache");
        }

        self.emit(ScanProgress::complete(roots.len()));
        info!(
            packs = descriptors.len(),
            classified = report.packs_classified,
            unclassified = report.unclassified.len(),
            groups = conflict_groups.len(),
            cache_hits = report.cache_hits,
            cache_misses = report.cache_misses,
            "Scan complete"
        );

        Ok(ScanOutcome {
            descriptors,
            conflict_groups,
            prior,
            report,
        })
    }

    /// Apply conflict resolutions and merge into the final ordering.
    pub fn finalize(
        &self,
        outcome: &ScanOutcome,
        resolutions: &ConflictResolutions,
        options: &MergeOptions,
    ) -> OrganiserResult<FinalManifest> {
        let groups = resolve_groups(outcome.conflict_groups.clone(), resolutions)?;
        Ok(self
            .merger
            .merge(&outcome.descriptors, &groups, &outcome.prior, options))
    }

    /// Atomically replace `scenery_packs.ini`.
    pub fn write(&self, manifest: &FinalManifest) -> OrganiserResult<WriteOutcome> {
        Ok(self.writer().write(manifest)?)
    }

    /// Per-pack phase on a bounded pool, results in input order.
    fn scan_packs(
        &self,
        roots: &[PathBuf],
    ) -> OrganiserResult<Vec<Result<ScannedPack, DescriptorBuildError>>> {
        let workers = self.config.effective_workers();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("sporganiser-scan-{}", i))
            .build()
            .map_err(|e| OrganiserError::WorkerPool(e.to_string()))?;

        debug!(workers, packs = roots.len(), "Starting pack scan");

        let total = roots.len();
        let completed = AtomicUsize::new(0);

        Ok(pool.install(|| {
            roots
                .par_iter()
                .map(|root| {
                    let result = self.scan_pack(root);
                    let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                    self.emit(ScanProgress::scanning(display_name_of(root), done, total));
                    result
                })
                .collect()
        }))
    }

    fn scan_pack(&self, root: &Path) -> Result<ScannedPack, DescriptorBuildError> {
        let mut descriptor = self.builder.build(root)?;

        let extraction = self.extractor.extract(&descriptor);
        descriptor.airport_ids = extraction.airport_ids;
        descriptor.hints = extraction.hints;

        let classification = self.classifier.apply(&mut descriptor);

        Ok(ScannedPack {
            descriptor,
            extraction_error: extraction.error,
            classification,
            cached: extraction.cached,
        })
    }

    fn emit(&self, progress: ScanProgress) {
        if let Some(callback) = &self.progress {
            callback(progress);
        }
    }
}

fn record_pack(report: &mut RunReport, pack: &ScannedPack) {
    let path = &pack.descriptor.path;

    if pack.cached {
        report.cache_hits += 1;
    } else {
        report.cache_misses += 1;
    }
    if let Some(e) = &pack.extraction_error {
        report.extraction_failures.push(PackIssue::new(path, e));
    }
    if let Some(warning) = &pack.descriptor.structural_warning {
        report.structural_warnings.push(PackIssue::new(path, warning));
    }
    match &pack.classification {
        Ok(matched) => report.count_tier(matched.tier),
        Err(reason) => report.unclassified.push(PackIssue::new(path, reason)),
    }
}

/// Candidate entries of `Custom Scenery`, sorted.
///
/// Hidden entries and plain files (including the manifest, its backups and
/// temp files) are skipped; `.lnk` files are kept so they get reported.
fn list_entries(scenery_dir: &Path) -> OrganiserResult<Vec<PathBuf>> {
    let list_err = |source| OrganiserError::ListFailed {
        path: scenery_dir.to_path_buf(),
        source,
    };

    let mut entries = Vec::new();
    for entry in fs::read_dir(scenery_dir).map_err(list_err)? {
        let entry = entry.map_err(list_err)?;
        let path = entry.path();

        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }

        let file_type = entry.file_type().map_err(list_err)?;
        let is_shortcut = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("lnk"));

        if file_type.is_dir() || file_type.is_symlink() || is_shortcut {
            entries.push(path);
        } else {
            debug!(file = %path.display(), "Skipping file in Custom Scenery");
        }
    }

    entries.sort();
    Ok(entries)
}
