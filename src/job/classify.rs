// src/job/classify.rs

use std::sync::LazyLock;

use regex::Regex;

/// A `[download]` marker followed by a percentage, an ETA or a transfer
/// rate. ytarchive prefixes its lines with a fragment counter (`12: `).
static PROGRESS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^\d+:\s+)?\[download\].+(?: at |ETA|%)").expect("progress pattern is valid")
});

/// How a log line participates in the progress log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Progress meter line; replaces a progress line directly before it.
    Progress,
    /// Everything else; always appended.
    Plain,
}

pub fn classify(line: &str) -> LineKind {
    if PROGRESS_RE.is_match(line) {
        LineKind::Progress
    } else {
        LineKind::Plain
    }
}
