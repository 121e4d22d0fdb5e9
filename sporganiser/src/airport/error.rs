//! Airport extraction errors.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// A malformed or unreadable airport definition file.
///
/// Always non-fatal: the pack proceeds with an empty identifier set and the
/// error is collected into the run report.
#[derive(Debug, Error)]
pub enum ExtractionParseError {
    /// The file could not be read or decompressed.
    #[error("Failed to read airport file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file holds another binary format under the airport file name.
    #[error("Airport file {path} contains {format} data")]
    ForeignFormat { path: PathBuf, format: &'static str },

    /// The file does not start with the `I`/`A` origin line.
    #[error("Airport file {path} has no origin line")]
    MissingOrigin { path: PathBuf },

    /// Identifier rows were present but none carried an identifier field.
    #[error("Airport file {path}: all {rows} airport rows are truncated")]
    TruncatedRows { path: PathBuf, rows: usize },
}

impl ExtractionParseError {
    /// The airport file that failed.
    pub fn path(&self) -> &Path {
        match self {
            Self::Io { path, .. }
            | Self::ForeignFormat { path, .. }
            | Self::MissingOrigin { path }
            | Self::TruncatedRows { path, .. } => path,
        }
    }
}
