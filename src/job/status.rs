// src/job/status.rs

use crate::types::JobStatus;

/// Substring the archivers print in front of fatal problems.
pub const FATAL_MARKER: &str = "ERROR:";

/// Derive a finished job's status from how the process exited and what it
/// wrote to stderr.
///
/// `exit_code` is `None` when the process was killed by a signal, which
/// counts as a failure. A clean exit is only `Done` when stderr is empty
/// too; any other stderr text is a warning unless it carries the fatal
/// marker.
pub fn resolve_status(exit_code: Option<i32>, stderr_log: &str) -> JobStatus {
    match exit_code {
        Some(0) => {}
        _ => return JobStatus::Error,
    }

    if stderr_log.contains(FATAL_MARKER) {
        JobStatus::Error
    } else if !stderr_log.trim().is_empty() {
        JobStatus::Warning
    } else {
        JobStatus::Done
    }
}
