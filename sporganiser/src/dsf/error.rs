use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors from probing DSF tiles.
#[derive(Debug, Error)]
pub enum DsfError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The tile is a 7-Zip archive; there is no decompressor in this build.
    #[error("{0} is 7-Zip compressed")]
    Compressed(PathBuf),

    #[error("{0} is not a DSF file")]
    BadMagic(PathBuf),

    #[error("{path} has unsupported DSF version {version}")]
    UnsupportedVersion { path: PathBuf, version: i32 },

    #[error("{0} ends inside an atom")]
    Truncated(PathBuf),

    #[error("{0} has no HEAD atom")]
    MissingHead(PathBuf),

    #[error("No DSF tiles under {0}")]
    NoTiles(PathBuf),
}
