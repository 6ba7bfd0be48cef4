// src/job/output.rs

//! Locating the file an archiver produced from its own log output.

use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;

use crate::types::BinaryKind;

const YTARCHIVE_MARKER: &str = "Final file:";

static YTDLP_DESTINATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)(?:Merging formats into|Destination):\s*["']?(?P<path>.+?)["']?\s*$"#)
        .expect("destination pattern is valid")
});

/// Extract the finalized output path from a job log.
///
/// - ytarchive: the rest of the line after the last `Final file:`.
/// - yt-dlp: the path on the last `Merging formats into` / `Destination`
///   line. yt-dlp prints one destination per downloaded format before the
///   merge, so the last match is the file that survives.
pub fn extract_final_path(log: &str, binary: BinaryKind) -> Option<PathBuf> {
    let raw = match binary {
        BinaryKind::Ytarchive => {
            let idx = log.rfind(YTARCHIVE_MARKER)?;
            let rest = &log[idx + YTARCHIVE_MARKER.len()..];
            rest.lines().next().unwrap_or_default().trim()
        }
        BinaryKind::Ytdlp => YTDLP_DESTINATION_RE
            .captures_iter(log)
            .last()
            .and_then(|caps| caps.name("path"))
            .map(|m| m.as_str().trim())?,
    };

    if raw.is_empty() {
        None
    } else {
        Some(PathBuf::from(raw))
    }
}
