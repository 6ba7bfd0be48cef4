use proptest::prelude::*;

use archivist::job::{classify, JobRecord, LineKind, ProgressLog};
use archivist::types::{BinaryKind, JobStatus, StreamSource};

#[test]
fn test_classify_recognises_progress_meters() {
    assert_eq!(classify("[download] 1%"), LineKind::Progress);
    assert_eq!(
        classify("[download]  42.0% of 10.00MiB at 1.00MiB/s ETA 00:05"),
        LineKind::Progress
    );
    assert_eq!(classify("12: [download] fragment 3 ETA 00:10"), LineKind::Progress);
}

#[test]
fn test_classify_treats_other_lines_as_plain() {
    assert_eq!(classify("[download] Destination: /downloads/abc.mp4"), LineKind::Plain);
    assert_eq!(classify("Selected quality: 1080p60"), LineKind::Plain);
    assert_eq!(classify("[info] 42% done"), LineKind::Plain);
    assert_eq!(classify(""), LineKind::Plain);
}

#[test]
fn test_consecutive_progress_lines_coalesce() {
    let mut log = ProgressLog::new();
    log.push("[download] 1%");
    log.push("[download] 50%");
    log.push("Destination: /downloads/abc.mp4");

    let lines: Vec<&str> = log.lines().collect();
    assert_eq!(lines, vec!["[download] 50%", "Destination: /downloads/abc.mp4"]);
    assert_eq!(log.render(), "[download] 50%\nDestination: /downloads/abc.mp4");
}

#[test]
fn test_progress_after_plain_line_is_appended() {
    let mut log = ProgressLog::new();
    log.push("[download] 10%");
    log.push("Merging fragments");
    log.push("[download] 20%");

    assert_eq!(log.len(), 3);
    assert_eq!(log.last().map(|l| l.text.as_str()), Some("[download] 20%"));
}

#[test]
fn test_ingest_line_sets_flags_and_stderr_log() {
    let mut rec = JobRecord::new("abc", BinaryKind::Ytdlp, "true", vec![]);
    assert_eq!(rec.status(), JobStatus::Pending);
    assert!(!rec.flags().started);

    rec.ingest_line("some warning text", StreamSource::Stderr);
    assert_eq!(rec.status(), JobStatus::Active);
    assert!(rec.flags().started);
    assert!(!rec.flags().active);
    assert_eq!(rec.stderr_log(), "some warning text\n");

    rec.ingest_line("[download] 5%", StreamSource::Stdout);
    assert!(rec.flags().active);
    assert_eq!(rec.stderr_log(), "some warning text\n");
    assert_eq!(rec.progress_log().len(), 2);
}

#[test]
fn test_view_hides_error_text_until_settled() {
    let mut rec = JobRecord::new("abc", BinaryKind::Ytdlp, "true", vec!["a".into()]);
    rec.ingest_line("careful", StreamSource::Stderr);

    let live = rec.view();
    assert_eq!(live.output, "careful");
    assert!(live.error.is_none());
    assert!(live.callback_cursor.is_none());
    assert!(live.callback_queue.is_none());

    rec.settle(JobStatus::Warning);
    let settled = rec.view();
    assert_eq!(settled.status, JobStatus::Warning);
    assert_eq!(settled.error.as_deref(), Some("careful\n"));
}

#[test]
fn test_view_serialises_status_as_numeric_code() {
    let mut rec = JobRecord::new("abc", BinaryKind::Ytdlp, "true", vec![]);
    rec.ingest_line("hello", StreamSource::Stdout);
    rec.settle(JobStatus::Done);

    let json = serde_json::to_value(rec.view()).unwrap();
    assert_eq!(json["status"], 1);
    assert_eq!(json["output"], "hello");
    assert!(json.get("error").is_none());
    assert!(json.get("callback_cursor").is_none());
}

fn progress_line() -> impl Strategy<Value = String> {
    (0u32..=100).prop_map(|pct| format!("[download] {pct}%"))
}

fn plain_line() -> impl Strategy<Value = String> {
    "[a-z ]{1,24}"
}

proptest! {
    #[test]
    fn prop_progress_line_twice_yields_one_line(line in progress_line()) {
        prop_assume!(classify(&line) == LineKind::Progress);
        let mut log = ProgressLog::new();
        log.push(&line);
        log.push(&line);
        prop_assert_eq!(log.len(), 1);
    }

    #[test]
    fn prop_plain_line_twice_yields_two_lines(line in plain_line()) {
        prop_assume!(classify(&line) == LineKind::Plain);
        let mut log = ProgressLog::new();
        log.push(&line);
        log.push(&line);
        prop_assert_eq!(log.len(), 2);
    }

    #[test]
    fn prop_log_never_holds_adjacent_progress_lines(
        lines in proptest::collection::vec(prop_oneof![progress_line(), plain_line()], 0..40)
    ) {
        let mut log = ProgressLog::new();
        for line in &lines {
            log.push(line);
        }
        let kinds: Vec<LineKind> = log.lines().map(classify).collect();
        for pair in kinds.windows(2) {
            prop_assert!(!(pair[0] == LineKind::Progress && pair[1] == LineKind::Progress));
        }
    }
}
