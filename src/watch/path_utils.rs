// src/watch/path_utils.rs

//! Utility functions for path handling in the watcher.

use std::path::Path;

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// A direct `strip_prefix(root)` is tried first; if that fails (symlinks,
/// `/private/var` vs `/var` on macOS), both paths are canonicalized and the
/// prefix is stripped again.
///
/// Returns `None` if the path cannot be related to `root`.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(to_slash(rel));
    }

    if let (Ok(root_canon), Ok(path_canon)) = (root.canonicalize(), path.canonicalize()) {
        if let Ok(rel) = path_canon.strip_prefix(&root_canon) {
            return Some(to_slash(rel));
        }
    }

    None
}

fn to_slash(rel: &Path) -> String {
    rel.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_root_prefix() {
        assert_eq!(
            relative_str(Path::new("/site"), Path::new("/site/scss/screen.scss")).as_deref(),
            Some("scss/screen.scss")
        );
    }

    #[test]
    fn unrelated_path_is_none() {
        assert_eq!(
            relative_str(Path::new("/site-that-does-not-exist"), Path::new("/elsewhere/a.css")),
            None
        );
    }

    #[test]
    fn current_dir_components_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("index.html");
        std::fs::write(&file, "<p></p>").unwrap();

        let dotted = dir.path().join(".").join("index.html");
        assert_eq!(relative_str(&dir.path().join("."), &dotted).as_deref(), Some("index.html"));
    }
}
