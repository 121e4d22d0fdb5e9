//! Scenery manifest: prior state, merge, and persistence.
//!
//! [`PriorManifest`] reads the flags a previous run (or the user, through
//! X-Plane) left behind, [`MergeEngine`] produces the ordered
//! [`FinalManifest`], and [`ManifestWriter`] replaces `scenery_packs.ini`
//! atomically.

mod format;
mod merge;
mod prior;
mod writer;

pub use format::{
    parse as parse_ini, target_path, target_text, IniLine, CUSTOM_SCENERY_DIR,
    DISABLED_DIRECTIVE, GLOBAL_AIRPORTS_TOKEN, HEADER, MANIFEST_FILE, PACK_DIRECTIVE,
    UNSORTED_FILE,
};
pub use merge::{
    FinalManifest, ManifestEntry, ManifestTarget, MergeEngine, MergeOptions, UnclassifiedPolicy,
};
pub use prior::{PriorEntry, PriorManifest};
pub use writer::{ManifestWriteError, ManifestWriter, WriteOutcome, BACKUP_EXTENSION};
