//! Directory entry to real pack path.
//!
//! The organiser never touches a `Custom Scenery` entry before it has been
//! resolved. Symlinks are followed; Windows `.lnk` shortcuts would need a
//! shell-link parser and are reported as unresolvable instead.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// An entry that does not lead to a pack directory.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Cannot resolve {path}: {reason}")]
pub struct Unresolvable {
    pub path: PathBuf,
    pub reason: String,
}

impl Unresolvable {
    pub fn new(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Resolves raw directory entries to canonical pack roots.
pub trait PathResolver: Send + Sync {
    fn resolve(&self, raw: &Path) -> Result<PathBuf, Unresolvable>;
}

/// Filesystem resolver: canonicalises and requires a directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsPathResolver;

impl PathResolver for FsPathResolver {
    fn resolve(&self, raw: &Path) -> Result<PathBuf, Unresolvable> {
        if raw
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("lnk"))
        {
            return Err(Unresolvable::new(raw, "Windows shortcuts are not supported"));
        }

        let real = fs::canonicalize(raw).map_err(|e| Unresolvable::new(raw, e.to_string()))?;
        if !real.is_dir() {
            return Err(Unresolvable::new(raw, "not a directory"));
        }
        Ok(real)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolves_directory() {
        let temp = TempDir::new().unwrap();
        let pack = temp.path().join("Pack");
        fs::create_dir(&pack).unwrap();

        let real = FsPathResolver.resolve(&pack).unwrap();
        assert_eq!(real, fs::canonicalize(&pack).unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn test_follows_symlink() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("elsewhere");
        fs::create_dir(&target).unwrap();
        let link = temp.path().join("link");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        assert_eq!(
            FsPathResolver.resolve(&link).unwrap(),
            fs::canonicalize(&target).unwrap()
        );
    }

    #[test]
    fn test_rejects_files_and_shortcuts() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("readme.txt");
        fs::write(&file, "x").unwrap();
        let lnk = temp.path().join("Pack.lnk");
        fs::write(&lnk, "x").unwrap();

        assert!(FsPathResolver.resolve(&file).is_err());
        assert!(FsPathResolver.resolve(&lnk).is_err());
        assert!(FsPathResolver.resolve(&temp.path().join("missing")).is_err());
    }
}
