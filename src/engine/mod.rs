// src/engine/mod.rs

//! Orchestration engine for archivist.
//!
//! [`JobService`] is what a request layer talks to: it owns the job table,
//! assigns ids, starts one supervision task per job and serves status
//! polls and deletions.

pub mod service;

pub use service::{JobRequest, JobService};
