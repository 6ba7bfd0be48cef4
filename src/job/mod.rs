// src/job/mod.rs

//! Per-job state and the pure rules applied to it.
//!
//! - [`classify`]: progress-vs-plain line classification.
//! - [`record`]: the `JobRecord` and the view handed to status polls.
//! - [`status`]: terminal status from exit code + stderr.
//! - [`output`]: finding the produced file in the log.

pub mod classify;
pub mod output;
pub mod record;
pub mod status;

pub use classify::{classify, LineKind};
pub use output::extract_final_path;
pub use record::{JobFlags, JobRecord, JobStatusView, LogLine, ProgressLog, SharedRecord};
pub use status::{resolve_status, FATAL_MARKER};
