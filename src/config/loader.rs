// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

pub const CONFIG_FILE_NAME: &str = "Assetpipe.toml";

/// Deserialize a config file without validating it.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let contents = fs::read_to_string(path.as_ref())?;
    Ok(toml::from_str(&contents)?)
}

/// Read, deserialize and validate a config file.
///
/// Missing sections fall back to their serde defaults; see
/// [`crate::config::validate`] for what is rejected.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    ConfigFile::try_from(load_from_path(path)?)
}

/// Same as [`load_and_validate`], for TOML already in memory.
pub fn parse_and_validate(contents: &str) -> Result<ConfigFile> {
    let raw: RawConfigFile = toml::from_str(contents)?;
    ConfigFile::try_from(raw)
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from(CONFIG_FILE_NAME)
}

/// Nearest `Assetpipe.toml` in `start` or one of its ancestors.
pub fn find_config(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_is_found_from_a_nested_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("botbot/templates");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "[task.css]\ncmd = \"true\"\n").unwrap();

        assert_eq!(find_config(&nested), Some(dir.path().join(CONFIG_FILE_NAME)));
    }

    #[test]
    fn nearest_config_wins() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("site");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "").unwrap();
        fs::write(nested.join(CONFIG_FILE_NAME), "").unwrap();

        assert_eq!(find_config(&nested), Some(nested.join(CONFIG_FILE_NAME)));
    }
}
