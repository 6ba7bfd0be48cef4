use std::collections::BTreeMap;

use archivist::command_line::{build_command, shell_quote, video_url, ParamValue};
use archivist::types::BinaryKind;
use archivist_test_utils::builders::ConfigFileBuilder;

fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, ParamValue> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.parse::<ParamValue>().unwrap()))
        .collect()
}

#[test]
fn test_shell_quote_escapes_single_quotes() {
    assert_eq!(shell_quote("plain"), "'plain'");
    assert_eq!(shell_quote("it's"), r"'it'\''s'");
}

#[test]
fn test_ytdlp_command_with_mapped_params() {
    let cfg = ConfigFileBuilder::new()
        .ytdlp("/opt/yt-dlp")
        .download_dir("/downloads")
        .cookie_file("/run/cookies.txt")
        .build();
    let p = params(&[
        ("wait_for_live", "true"),
        ("threads", "4"),
        ("use_cookies", "true"),
        ("embed_thumbnail", "false"),
    ]);

    let cmd = build_command(&cfg, BinaryKind::Ytdlp, &video_url("abc"), "1080p", &p);

    assert_eq!(
        cmd,
        "'/opt/yt-dlp' --concurrent-fragments '4' --cookies '/run/cookies.txt' \
         --live-from-start --paths '/downloads' -f 'bestvideo[height=1080]' \
         --progress --newline --no-colors 'https://youtu.be/abc'"
    );
}

#[test]
fn test_ytdlp_audio_only_suppresses_remux() {
    let cfg = ConfigFileBuilder::new().ytdlp("yt-dlp").build();
    let p = params(&[("force_mkv", "true")]);

    let audio = build_command(&cfg, BinaryKind::Ytdlp, "u", "audio_only", &p);
    assert!(!audio.contains("--remux-video"));
    assert!(audio.contains(" -x --extract-audio"));

    let video = build_command(&cfg, BinaryKind::Ytdlp, "u", "best", &p);
    assert!(video.contains(" --remux-video mkv --merge-output-format mkv"));
    assert!(!video.contains(" -f "));
}

#[test]
fn test_ytarchive_output_goes_under_download_dir() {
    let cfg = ConfigFileBuilder::new()
        .ytarchive("ytarchive")
        .download_dir("/downloads/")
        .build();
    let p = params(&[("output_filename", "%(title)s"), ("wait_for_live", "true")]);

    let cmd = build_command(&cfg, BinaryKind::Ytarchive, &video_url("xyz"), "best", &p);

    assert_eq!(
        cmd,
        "'ytarchive' --output '/downloads/%(title)s' --wait 'https://youtu.be/xyz' 'best'"
    );
}

#[test]
fn test_unmapped_params_pass_through_and_custom_params_are_dropped() {
    let cfg = ConfigFileBuilder::new().ytarchive("ytarchive").build();
    let p = params(&[
        ("--no-frag-files", "true"),
        ("--vp9", "false"),
        ("--proxy", "socks5://h:1"),
        ("customParams", "anything"),
    ]);

    let cmd = build_command(&cfg, BinaryKind::Ytarchive, "u", "best", &p);

    assert_eq!(
        cmd,
        "'ytarchive' --no-frag-files --proxy 'socks5://h:1' 'u' 'best'"
    );
}
