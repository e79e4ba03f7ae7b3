// src/fs/mock.rs

use std::collections::{BTreeMap, BTreeSet};
use std::io::{Cursor, Read};
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{anyhow, Result};

use super::FileSystem;

#[derive(Debug, Clone)]
enum MockEntry {
    File(Vec<u8>),
    Dir(BTreeSet<String>),
}

/// In-memory filesystem for tests.
///
/// Paths are normalised by dropping `.` components, so `./scss/a.scss` and
/// `scss/a.scss` name the same entry. The root is `.`. Clones share state,
/// which lets a test keep a handle while the pipeline writes through another.
#[derive(Debug, Clone)]
pub struct MockFileSystem {
    entries: Arc<Mutex<BTreeMap<PathBuf, MockEntry>>>,
    writes: Arc<Mutex<Vec<PathBuf>>>,
}

impl Default for MockFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFileSystem {
    pub fn new() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(PathBuf::from("."), MockEntry::Dir(BTreeSet::new()));

        Self {
            entries: Arc::new(Mutex::new(entries)),
            writes: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = normalize(path.as_ref());
        let mut entries = self.lock_entries();
        if let Some(parent) = path.parent() {
            ensure_dir(&mut entries, &parent_or_root(parent), &path);
        }
        entries.insert(path, MockEntry::File(content.into()));
    }

    /// Contents of a file as UTF-8, or `None` if it does not exist.
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<String> {
        self.read_to_string(path.as_ref()).ok()
    }

    /// Every path written through [`FileSystem::write`], in write order.
    pub fn written(&self) -> Vec<PathBuf> {
        self.writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn lock_entries(&self) -> MutexGuard<'_, BTreeMap<PathBuf, MockEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Register `dir` (and its ancestors) and record `child` as one of its entries.
fn ensure_dir(entries: &mut BTreeMap<PathBuf, MockEntry>, dir: &Path, child: &Path) {
    let Some(name) = child.file_name().and_then(|n| n.to_str()) else {
        return;
    };

    if !entries.contains_key(dir) {
        entries.insert(dir.to_path_buf(), MockEntry::Dir(BTreeSet::new()));
        if let Some(parent) = dir.parent() {
            let parent = parent_or_root(parent);
            if parent != dir {
                ensure_dir(entries, &parent, dir);
            }
        }
    }

    if let Some(MockEntry::Dir(children)) = entries.get_mut(dir) {
        children.insert(name.to_string());
    }
}

fn parent_or_root(parent: &Path) -> PathBuf {
    if parent.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        parent.to_path_buf()
    }
}

fn normalize(path: &Path) -> PathBuf {
    let out: PathBuf = path
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    if out.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        out
    }
}

impl FileSystem for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        match self.lock_entries().get(&normalize(path)) {
            Some(MockEntry::File(content)) => {
                String::from_utf8(content.clone()).map_err(|e| anyhow!("invalid UTF-8 in {path:?}: {e}"))
            }
            Some(MockEntry::Dir(_)) => Err(anyhow!("is a directory: {path:?}")),
            None => Err(anyhow!("file not found: {path:?}")),
        }
    }

    fn open_read(&self, path: &Path) -> Result<Box<dyn Read + Send>> {
        match self.lock_entries().get(&normalize(path)) {
            Some(MockEntry::File(content)) => Ok(Box::new(Cursor::new(content.clone()))),
            Some(MockEntry::Dir(_)) => Err(anyhow!("is a directory: {path:?}")),
            None => Err(anyhow!("file not found: {path:?}")),
        }
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.add_file(path, contents);
        self.writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(normalize(path));
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.lock_entries().contains_key(&normalize(path))
    }

    fn is_file(&self, path: &Path) -> bool {
        matches!(self.lock_entries().get(&normalize(path)), Some(MockEntry::File(_)))
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(self.lock_entries().get(&normalize(path)), Some(MockEntry::Dir(_)))
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let normalized = normalize(path);
        match self.lock_entries().get(&normalized) {
            Some(MockEntry::Dir(children)) => Ok(children.iter().map(|name| path.join(name)).collect()),
            _ => Err(anyhow!("not a directory or not found: {path:?}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_files_show_up_in_parent_listings() {
        let fs = MockFileSystem::new();
        fs.add_file("scss/partials/_nav.scss", "nav{}");
        fs.add_file("scss/screen.scss", "body{}");

        assert!(fs.is_dir(Path::new("scss")));
        assert_eq!(
            fs.read_dir(Path::new("./scss")).unwrap(),
            vec![PathBuf::from("./scss/partials"), PathBuf::from("./scss/screen.scss")]
        );
        assert_eq!(fs.contents("./scss/screen.scss").as_deref(), Some("body{}"));
    }

    #[test]
    fn writes_are_recorded() {
        let fs = MockFileSystem::new();
        fs.write(Path::new("out/app.js"), b"x").unwrap();
        assert_eq!(fs.written(), vec![PathBuf::from("out/app.js")]);
    }
}
