//! Error types for the organiser pipeline.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::manifest::ManifestWriteError;
use crate::overlap::ResolutionError;

/// Result type for organiser operations.
pub type OrganiserResult<T> = Result<T, OrganiserError>;

/// Whole-run failures. Per-pack problems never surface here; they are
/// collected in the [`RunReport`](super::RunReport).
#[derive(Debug, Error)]
pub enum OrganiserError {
    #[error("Custom Scenery folder not found: {0}")]
    MissingSceneryDir(PathBuf),

    #[error("Failed to list {path}: {source}")]
    ListFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read previous manifest in {path}: {source}")]
    PriorManifest {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to start worker pool: {0}")]
    WorkerPool(String),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Write(#[from] ManifestWriteError),
}
