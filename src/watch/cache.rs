// src/watch/cache.rs

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::debug;

use crate::fs::FileSystem;
use crate::watch::hash::compute_file_hash;

/// In-memory cache of file hashes.
///
/// Only the file named by a change event is re-hashed; every other file a
/// rule matches is served from here.
#[derive(Debug, Default)]
pub struct FileCache {
    hashes: HashMap<PathBuf, String>,
}

impl FileCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the hash for a file, computing and caching it if necessary.
    pub fn get_or_compute(&mut self, fs: &dyn FileSystem, path: &Path) -> Result<String> {
        if let Some(hash) = self.hashes.get(path) {
            return Ok(hash.clone());
        }

        debug!(path = ?path, "cache miss: computing hash");
        let hash = compute_file_hash(fs, path)?;
        self.hashes.insert(path.to_path_buf(), hash.clone());
        Ok(hash)
    }

    /// Invalidate the cached hash for a file (e.g. on change).
    pub fn invalidate(&mut self, path: &Path) {
        if self.hashes.remove(path).is_some() {
            debug!(path = ?path, "invalidated cached hash");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    #[test]
    fn stale_hash_is_served_until_invalidated() {
        let fs = MockFileSystem::new();
        fs.add_file("index.html", "v1");
        let path = Path::new("index.html");

        let mut cache = FileCache::new();
        let first = cache.get_or_compute(&fs, path).unwrap();

        fs.add_file("index.html", "v2");
        assert_eq!(cache.get_or_compute(&fs, path).unwrap(), first);

        cache.invalidate(path);
        assert_ne!(cache.get_or_compute(&fs, path).unwrap(), first);
    }
}
