// tests/config_loading.rs

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use tempfile::NamedTempFile;

use archivist::callback::CallbackRegistry;
use archivist::config::{load_from_path, parse_duration, ConfigFile, Placement};
use archivist::errors::ArchivistError;
use archivist::types::{BinaryKind, DuplicatePolicy};
use archivist_test_utils::builders::ConfigFileBuilder;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn test_full_config_file_round_trips_into_validated_config() {
    let file = write_config(
        r#"
[config]
grace_period = "250ms"
duplicate_ids = "reject"
download_dir = "/srv/archive"
cookie_file = "/etc/archivist/cookies.txt"
shell = ["bash", "-lc"]

[binaries]
ytarchive = "/usr/local/bin/ytarchive"

[callback.size]
cmd = "du -h {file}"

[callback.probe]
cmd = "ffprobe {file}"
placement = "front"
label = "Media info"
"#,
    );

    let raw = load_from_path(file.path()).unwrap();
    let cfg = ConfigFile::try_from(raw).unwrap();

    assert_eq!(cfg.grace_period, Duration::from_millis(250));
    assert_eq!(cfg.duplicate_policy, DuplicatePolicy::Reject);
    assert_eq!(cfg.download_dir, "/srv/archive");
    assert_eq!(cfg.cookie_file, PathBuf::from("/etc/archivist/cookies.txt"));
    assert_eq!(cfg.shell.program, "bash");
    assert_eq!(cfg.shell.args, vec!["-lc".to_string()]);
    assert_eq!(
        cfg.binaries.path_for(BinaryKind::Ytarchive),
        PathBuf::from("/usr/local/bin/ytarchive")
    );
    assert_eq!(cfg.binaries.path_for(BinaryKind::Ytdlp), PathBuf::from("./yt-dlp"));

    assert_eq!(cfg.callbacks["size"].placement, Placement::End);
    assert_eq!(cfg.callbacks["probe"].placement, Placement::Front);
    assert_eq!(cfg.callbacks["probe"].label.as_deref(), Some("Media info"));

    let registry = CallbackRegistry::from_config(&cfg);
    assert_eq!(registry.ids(), vec!["probe".to_string(), "size".to_string()]);
}

#[test]
fn test_empty_file_uses_defaults() {
    let file = write_config("");
    let cfg = ConfigFile::try_from(load_from_path(file.path()).unwrap()).unwrap();

    assert_eq!(cfg.grace_period, Duration::from_secs(5));
    assert_eq!(cfg.duplicate_policy, DuplicatePolicy::Suffix);
    assert_eq!(cfg.download_dir, "/downloads");
    assert_eq!(cfg.cookie_file, PathBuf::from("./cookie.txt"));
    assert!(cfg.callbacks.is_empty());
}

#[test]
fn test_malformed_toml_is_toml_error() {
    let file = write_config("[config\ngrace_period = ");
    assert!(matches!(load_from_path(file.path()), Err(ArchivistError::TomlError(_))));
}

#[test]
fn test_missing_file_is_io_error() {
    let res = load_from_path("/definitely/not/here/Archivist.toml");
    assert!(matches!(res, Err(ArchivistError::IoError(_))));
}

#[test]
fn test_zero_grace_period_is_rejected() {
    let raw = ConfigFileBuilder::new().grace_period("0s").raw();
    match ConfigFile::try_from(raw) {
        Err(ArchivistError::ConfigError(msg)) => assert!(msg.contains("grace_period")),
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn test_unknown_duplicate_policy_is_rejected() {
    let raw = ConfigFileBuilder::new().duplicate_ids("overwrite").raw();
    match ConfigFile::try_from(raw) {
        Err(ArchivistError::ConfigError(msg)) => assert!(msg.contains("duplicate_ids")),
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn test_empty_shell_is_rejected() {
    let raw = ConfigFileBuilder::new().shell(&[]).raw();
    assert!(matches!(
        ConfigFile::try_from(raw),
        Err(ArchivistError::ConfigError(_))
    ));
}

#[test]
fn test_callback_without_command_is_rejected() {
    let raw = ConfigFileBuilder::new()
        .with_callback("empty", "   ", Placement::End)
        .raw();
    match ConfigFile::try_from(raw) {
        Err(ArchivistError::ConfigError(msg)) => assert!(msg.contains("empty")),
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn test_parse_duration_units() {
    assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
    assert_eq!(parse_duration("5s"), Ok(Duration::from_secs(5)));
    assert_eq!(parse_duration("2m"), Ok(Duration::from_secs(120)));
    assert_eq!(parse_duration("1h"), Ok(Duration::from_secs(3600)));
    assert!(parse_duration("").is_err());
    assert!(parse_duration("10").is_err());
    assert!(parse_duration("3d").is_err());
}

#[test]
fn test_parse_duration_rejects_overflow() {
    assert!(parse_duration("307445734561825861m").is_err());
    assert!(parse_duration("5124095576030432h").is_err());
    assert_eq!(
        parse_duration("5124095576030431h"),
        Ok(Duration::from_secs(5124095576030431 * 3600))
    );
}

#[test]
fn test_oversized_grace_period_is_config_error() {
    let raw = ConfigFileBuilder::new().grace_period("5124095576030432h").raw();
    match ConfigFile::try_from(raw) {
        Err(ArchivistError::ConfigError(msg)) => assert!(msg.contains("too large")),
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn test_duplicate_policy_defaults_to_suffix() {
    assert_eq!(DuplicatePolicy::default(), DuplicatePolicy::Suffix);
    assert_eq!("REJECT".parse::<DuplicatePolicy>(), Ok(DuplicatePolicy::Reject));
}
