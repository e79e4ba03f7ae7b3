// src/exec/mod.rs

//! Task execution layer.
//!
//! - [`executor_loop`] owns the loop that receives scheduled tasks.
//! - [`task_runner`] runs one task (pipeline, command, reload or group).
//! - [`command`] runs shell commands with `tokio::process`.
//! - [`backend`] provides the `ExecutorBackend` trait and the production
//!   `RealExecutorBackend`; tests replace it with a fake.

pub mod backend;
pub mod command;
pub mod executor_loop;
pub mod task_runner;

pub use backend::{ExecutorBackend, RealExecutorBackend};
pub use executor_loop::spawn_executor;
