// src/job/record.rs

//! Mutable state for one job.
//!
//! A record is shared between its supervision task, its two stream drains
//! and the job table as a [`SharedRecord`]. Locks are only ever taken for
//! short synchronous updates, never across an `.await`.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use crate::job::classify::{classify, LineKind};
use crate::types::{BinaryKind, JobStatus, StreamSource};

pub type SharedRecord = Arc<Mutex<JobRecord>>;

#[derive(Debug, Clone)]
pub struct LogLine {
    pub text: String,
    pub kind: LineKind,
}

/// Append-only log whose last line may be replaced when both it and the
/// incoming line are progress lines.
#[derive(Debug, Clone, Default)]
pub struct ProgressLog {
    lines: Vec<LogLine>,
}

impl ProgressLog {
    pub fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Classify and store a line, returning its kind.
    pub fn push(&mut self, line: &str) -> LineKind {
        let kind = classify(line);
        let entry = LogLine {
            text: line.to_string(),
            kind,
        };

        match (kind, self.lines.last_mut()) {
            (LineKind::Progress, Some(last)) if last.kind == LineKind::Progress => {
                *last = entry;
            }
            _ => self.lines.push(entry),
        }

        kind
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(|l| l.text.as_str())
    }

    pub fn last(&self) -> Option<&LogLine> {
        self.lines.last()
    }

    /// Newline-joined text, as shown to clients.
    pub fn render(&self) -> String {
        self.lines().collect::<Vec<_>>().join("\n")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobFlags {
    /// At least one non-empty line was seen.
    pub started: bool,
    /// At least one genuine progress update was seen.
    pub active: bool,
    /// Process exited and post-processing finished. Never reset.
    pub completed: bool,
}

#[derive(Debug)]
pub struct JobRecord {
    id: String,
    binary: BinaryKind,
    command: String,
    pid: Option<u32>,
    progress_log: ProgressLog,
    stderr_log: String,
    flags: JobFlags,
    status: JobStatus,
    callback_queue: Vec<String>,
    callback_cursor: Option<usize>,
    /// `None` until the process has exited; from then on the client-facing
    /// output, with callback blocks spliced in.
    final_log: Option<String>,
    /// Error side of the final output: stderr plus callback error blocks.
    final_err: String,
}

impl JobRecord {
    pub fn new(
        id: impl Into<String>,
        binary: BinaryKind,
        command: impl Into<String>,
        callback_queue: Vec<String>,
    ) -> Self {
        Self {
            id: id.into(),
            binary,
            command: command.into(),
            pid: None,
            progress_log: ProgressLog::new(),
            stderr_log: String::new(),
            flags: JobFlags::default(),
            status: JobStatus::Pending,
            callback_queue,
            callback_cursor: None,
            final_log: None,
            final_err: String::new(),
        }
    }

    pub fn into_shared(self) -> SharedRecord {
        Arc::new(Mutex::new(self))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn binary(&self) -> BinaryKind {
        self.binary
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn flags(&self) -> JobFlags {
        self.flags
    }

    pub fn progress_log(&self) -> &ProgressLog {
        &self.progress_log
    }

    pub fn stderr_log(&self) -> &str {
        &self.stderr_log
    }

    pub fn callback_queue(&self) -> &[String] {
        &self.callback_queue
    }

    pub fn callback_cursor(&self) -> Option<usize> {
        self.callback_cursor
    }

    pub fn final_log(&self) -> Option<&str> {
        self.final_log.as_deref()
    }

    pub fn final_err(&self) -> &str {
        &self.final_err
    }

    /// The process was launched.
    pub fn mark_spawned(&mut self, pid: Option<u32>) {
        self.pid = pid;
    }

    /// Apply one trimmed, non-empty output line.
    pub fn ingest_line(&mut self, line: &str, source: StreamSource) {
        if !self.flags.started {
            self.flags.started = true;
            if self.status == JobStatus::Pending {
                self.status = JobStatus::Active;
            }
        }

        if self.progress_log.push(line) == LineKind::Progress {
            self.flags.active = true;
        }

        if source == StreamSource::Stderr {
            self.stderr_log.push_str(line);
            self.stderr_log.push('\n');
        }
    }

    /// Freeze the drained output as the starting point for the final log and
    /// record the resolved status.
    pub fn settle(&mut self, status: JobStatus) {
        self.final_log = Some(self.progress_log.render());
        self.final_err = self.stderr_log.clone();
        self.status = status;
    }

    /// The process never started: error status with the launch failure text.
    pub fn fail_spawn(&mut self, detail: &str) {
        let mut log = self.progress_log.render();
        log.push_str("\n\n[SYSTEM ERROR] Failed to launch subprocess:\n");
        log.push_str(detail);
        self.final_log = Some(log);
        self.final_err = self.stderr_log.clone();
        self.status = JobStatus::Error;
        self.flags.completed = true;
    }

    pub fn set_status(&mut self, status: JobStatus) {
        self.status = status;
    }

    pub fn set_callback_cursor(&mut self, cursor: Option<usize>) {
        self.callback_cursor = cursor;
    }

    /// Both sides of the final output, for callback splicing.
    pub(crate) fn final_logs_mut(&mut self) -> (&mut String, &mut String) {
        let out = self
            .final_log
            .get_or_insert_with(|| self.progress_log.render());
        (out, &mut self.final_err)
    }

    pub fn mark_completed(&mut self) {
        self.flags.completed = true;
    }

    /// Read-only snapshot for status polling.
    pub fn view(&self) -> JobStatusView {
        let output = match &self.final_log {
            Some(log) => log.clone(),
            None => self.progress_log.render(),
        };

        let error = if self.final_log.is_some() && !self.final_err.trim().is_empty() {
            Some(self.final_err.clone())
        } else {
            None
        };

        let (callback_cursor, callback_queue) = match self.callback_cursor {
            Some(cursor) => (Some(cursor), Some(self.callback_queue.clone())),
            None => (None, None),
        };

        JobStatusView {
            status: self.status,
            output,
            error,
            callback_cursor,
            callback_queue,
            completed: self.flags.completed,
        }
    }
}

/// What a status poll returns for one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobStatusView {
    pub status: JobStatus,
    pub output: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_cursor: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_queue: Option<Vec<String>>,
    pub completed: bool,
}
