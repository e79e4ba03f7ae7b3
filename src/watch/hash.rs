use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use blake3::Hasher;
use tracing::info;

use crate::fs::FileSystem;

/// Compute the hash of a single file.
pub fn compute_file_hash(fs: &dyn FileSystem, path: &Path) -> Result<String> {
    let mut hasher = Hasher::new();
    let mut file = fs
        .open_read(path)
        .with_context(|| format!("opening file for hashing: {path:?}"))?;
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

/// Compute aggregate hash from a list of file hashes.
///
/// `hashes` must be sorted by the corresponding file path to ensure stability.
pub fn compute_aggregate_hash(hashes: &[String]) -> String {
    let mut hasher = Hasher::new();
    for h in hashes {
        hasher.update(h.as_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

/// Storage for the last aggregate hash seen per watch rule.
pub trait HashStore: Send + Sync {
    fn load(&self, key: &str) -> Option<String>;
    fn save(&mut self, key: &str, hash: &str);
}

/// Keeps rule hashes for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemoryHashStore {
    map: HashMap<String, String>,
}

impl MemoryHashStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HashStore for MemoryHashStore {
    fn load(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    fn save(&mut self, key: &str, hash: &str) {
        self.map.insert(key.to_string(), hash.to_string());
        info!(rule = %key, hash = %hash, "stored watch rule hash");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    #[test]
    fn file_hash_follows_content() {
        let fs = MockFileSystem::new();
        fs.add_file("a.html", "<p>one</p>");
        let first = compute_file_hash(&fs, Path::new("a.html")).unwrap();

        fs.add_file("a.html", "<p>one</p>");
        assert_eq!(compute_file_hash(&fs, Path::new("a.html")).unwrap(), first);

        fs.add_file("a.html", "<p>two</p>");
        assert_ne!(compute_file_hash(&fs, Path::new("a.html")).unwrap(), first);
    }

    #[test]
    fn aggregate_hash_depends_on_order() {
        let a = "a".to_string();
        let b = "b".to_string();
        assert_ne!(
            compute_aggregate_hash(&[a.clone(), b.clone()]),
            compute_aggregate_hash(&[b, a])
        );
    }

    #[test]
    fn memory_store_round_trips() {
        let mut store = MemoryHashStore::new();
        assert_eq!(store.load("watch#0"), None);
        store.save("watch#0", "abc");
        assert_eq!(store.load("watch#0").as_deref(), Some("abc"));
    }
}
