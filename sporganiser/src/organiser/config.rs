//! Configuration for the organiser pipeline.

use std::path::PathBuf;

use crate::manifest::CUSTOM_SCENERY_DIR;

/// Configuration for an [`Organiser`](super::Organiser) run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganiserConfig {
    /// X-Plane installation root.
    pub install_dir: PathBuf,

    /// Worker threads for the per-pack phase; 0 uses one per core.
    pub workers: usize,

    /// Persistent airport cache. `None` keeps the cache in memory only.
    pub cache_file: Option<PathBuf>,
}

impl OrganiserConfig {
    /// Create a configuration for an X-Plane install with an in-memory cache.
    pub fn new(install_dir: impl Into<PathBuf>) -> Self {
        Self {
            install_dir: install_dir.into(),
            workers: 0,
            cache_file: None,
        }
    }

    /// Set the worker count.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Persist the airport cache at `path`.
    pub fn with_cache_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_file = Some(path.into());
        self
    }

    /// The `Custom Scenery` folder.
    pub fn scenery_dir(&self) -> PathBuf {
        self.install_dir.join(CUSTOM_SCENERY_DIR)
    }

    /// Worker count with 0 replaced by the available parallelism.
    pub fn effective_workers(&self) -> usize {
        if self.workers > 0 {
            self.workers
        } else {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OrganiserConfig::new("/xp");
        assert_eq!(config.workers, 0);
        assert!(config.cache_file.is_none());
        assert_eq!(config.scenery_dir(), PathBuf::from("/xp/Custom Scenery"));
        assert!(config.effective_workers() >= 1);
    }

    #[test]
    fn test_builder_pattern() {
        let config = OrganiserConfig::new("/xp")
            .with_workers(3)
            .with_cache_file("/tmp/cache.bin");

        assert_eq!(config.effective_workers(), 3);
        assert_eq!(config.cache_file, Some(PathBuf::from("/tmp/cache.bin")));
    }
}
