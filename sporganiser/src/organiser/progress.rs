//! Progress reporting for the scan phase.

use std::sync::Arc;

/// Progress callback for [`Organiser::scan`](super::Organiser::scan).
///
/// Called from worker threads, so it must be `Send + Sync`.
pub type ScanProgressCallback = Arc<dyn Fn(ScanProgress) + Send + Sync>;

/// Current phase of a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    /// Listing and resolving `Custom Scenery` entries.
    Discovering,
    /// Building, extracting and classifying packs.
    Scanning,
    /// Grouping overlapping custom airports.
    DetectingOverlaps,
    Complete,
}

/// Progress snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanProgress {
    pub phase: ScanPhase,
    /// Pack that just finished, during [`ScanPhase::Scanning`].
    pub current_pack: Option<String>,
    pub packs_complete: usize,
    pub packs_total: usize,
}

impl ScanProgress {
    pub fn discovering() -> Self {
        Self {
            phase: ScanPhase::Discovering,
            current_pack: None,
            packs_complete: 0,
            packs_total: 0,
        }
    }

    pub fn scanning(pack: impl Into<String>, complete: usize, total: usize) -> Self {
        Self {
            phase: ScanPhase::Scanning,
            current_pack: Some(pack.into()),
            packs_complete: complete,
            packs_total: total,
        }
    }

    pub fn detecting(total: usize) -> Self {
        Self {
            phase: ScanPhase::DetectingOverlaps,
            current_pack: None,
            packs_complete: total,
            packs_total: total,
        }
    }

    pub fn complete(total: usize) -> Self {
        Self {
            phase: ScanPhase::Complete,
            current_pack: None,
            packs_complete: total,
            packs_total: total,
        }
    }

    /// Completion in percent, 100 when there is nothing to do.
    pub fn percent(&self) -> f64 {
        if self.packs_total == 0 {
            100.0
        } else {
            self.packs_complete as f64 * 100.0 / self.packs_total as f64
        }
    }
}
