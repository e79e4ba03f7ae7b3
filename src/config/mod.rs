// src/config/mod.rs

//! `Assetpipe.toml`: the data model, discovery and loading, and the checks
//! that turn a [`RawConfigFile`] into a [`ConfigFile`].

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{
    default_config_path, find_config, load_and_validate, load_from_path, parse_and_validate,
    CONFIG_FILE_NAME,
};
pub use model::{
    BannerSection, ConfigFile, ConfigSection, DefaultSection, PackageSection, RawConfigFile,
    ReloadSection, StageConfig, TaskAction, TaskConfig, WatchRuleConfig,
};
