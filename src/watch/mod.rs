// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Compiling each `[[watch]]` rule into a [`WatchProfile`].
//! - Wiring up a cross-platform filesystem watcher (`notify`) behind a
//!   debouncer.
//! - Optionally hashing watched content so a rule only fires when the files
//!   it matches actually changed.
//!
//! It does not schedule anything itself; it only turns filesystem changes
//! into task-level triggers.

pub mod cache;
pub mod dag_filter;
pub mod debouncer;
pub mod event_handler;
pub mod hash;
pub mod path_utils;
pub mod patterns;
pub mod watcher;

pub use dag_filter::{dep_map_from_graph, DepMap};
pub use event_handler::{process_file_change, WatchContext};
pub use hash::{HashStore, MemoryHashStore};
pub use patterns::{build_rule_profiles, collect_matching_files, WatchProfile};
pub use watcher::{spawn_watcher, WatcherHandle};
