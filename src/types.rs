// src/types.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};

/// Which external archiver a job runs.
///
/// The kind decides how the final output file is located in the log and
/// which flags the command builder emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BinaryKind {
    /// `ytarchive`: reports its output as `Final file: <path>`.
    Ytarchive,
    /// `yt-dlp`: reports `Destination:` / `Merging formats into` lines.
    Ytdlp,
}

impl fmt::Display for BinaryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinaryKind::Ytarchive => f.write_str("ytarchive"),
            BinaryKind::Ytdlp => f.write_str("ytdlp"),
        }
    }
}

impl FromStr for BinaryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ytarchive" => Ok(BinaryKind::Ytarchive),
            "ytdlp" | "yt-dlp" => Ok(BinaryKind::Ytdlp),
            other => Err(format!(
                "invalid binary: {other} (expected \"ytarchive\" or \"ytdlp\")"
            )),
        }
    }
}

/// Lifecycle status of a job.
///
/// Serialised as the numeric codes the status endpoint has always used:
/// done=1, error=2, callback=3, warning=4, active=5, pending=6. `Cancelled`
/// gets 7 but is never polled: the entry is gone once cancellation finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStatus {
    Pending,
    Active,
    Done,
    Error,
    Warning,
    CallbackPending,
    Cancelled,
}

impl JobStatus {
    pub fn code(self) -> u8 {
        match self {
            JobStatus::Done => 1,
            JobStatus::Error => 2,
            JobStatus::CallbackPending => 3,
            JobStatus::Warning => 4,
            JobStatus::Active => 5,
            JobStatus::Pending => 6,
            JobStatus::Cancelled => 7,
        }
    }

    /// Done, Error and Warning are the only states a finished job settles in.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Error | JobStatus::Warning)
    }
}

impl Serialize for JobStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobStatus::Pending => "pending",
            JobStatus::Active => "active",
            JobStatus::Done => "done",
            JobStatus::Error => "error",
            JobStatus::Warning => "warning",
            JobStatus::CallbackPending => "callback",
            JobStatus::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// What to do when a new job asks for a base id that is already live.
///
/// - `Suffix`: allocate `base.0`, `base.1`, ... (default behaviour).
/// - `Reject`: refuse the request with a conflict error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    #[default]
    Suffix,
    Reject,
}

impl FromStr for DuplicatePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "suffix" => Ok(DuplicatePolicy::Suffix),
            "reject" => Ok(DuplicatePolicy::Reject),
            other => Err(format!(
                "invalid duplicate_ids: {other} (expected \"suffix\" or \"reject\")"
            )),
        }
    }
}

/// Which pipe a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamSource {
    Stdout,
    Stderr,
}

impl fmt::Display for StreamSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamSource::Stdout => f.write_str("stdout"),
            StreamSource::Stderr => f.write_str("stderr"),
        }
    }
}
