// src/exec/mod.rs

//! Process execution layer.
//!
//! Runs job command lines with `tokio::process::Command` and keeps the job
//! record up to date while they run.
//!
//! - [`drain`] reads stdout/stderr line by line into the record.
//! - [`supervisor`] spawns the process, waits for it, resolves its status,
//!   runs callbacks and handles termination on cancel.

pub mod drain;
pub mod supervisor;

pub use drain::{drain_both, drain_stream};
pub use supervisor::{shell_command, terminate, Supervisor};
