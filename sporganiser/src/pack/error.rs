//! Descriptor build errors.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that exclude a pack from tiering.
///
/// These are collected per pack and reported; they never abort a run.
#[derive(Debug, Error)]
pub enum DescriptorBuildError {
    /// The pack root could not be listed.
    #[error("cannot read pack directory {path}: {source}")]
    Unreadable { path: PathBuf, source: io::Error },

    /// The pack root has no visible entries.
    #[error("pack directory is empty: {0}")]
    Empty(PathBuf),

    /// The pack root has entries, but none that X-Plane would load.
    #[error("no recognizable scenery content in {0}")]
    NoRecognizableContent(PathBuf),
}

impl DescriptorBuildError {
    /// Path of the pack that failed.
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::Unreadable { path, .. } => path,
            Self::Empty(path) => path,
            Self::NoRecognizableContent(path) => path,
        }
    }
}
