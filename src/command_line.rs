// src/command_line.rs

//! Renders the shell command line for an archiver run.
//!
//! Canonical parameter names are mapped to each tool's flags; anything else
//! is passed through as-is with a warning.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::Deserialize;
use tracing::warn;

use crate::config::ConfigFile;
use crate::types::BinaryKind;

/// Free-form parameter key that carries UI state only and is never rendered.
const CUSTOM_PARAMS_KEY: &str = "customParams";

/// A parameter value: a switch or a piece of text.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Flag(bool),
    Text(String),
}

impl ParamValue {
    fn is_set(&self) -> bool {
        match self {
            ParamValue::Flag(b) => *b,
            ParamValue::Text(s) => !s.is_empty(),
        }
    }

    fn as_text(&self) -> String {
        match self {
            ParamValue::Flag(b) => b.to_string(),
            ParamValue::Text(s) => s.clone(),
        }
    }
}

impl FromStr for ParamValue {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "true" => ParamValue::Flag(true),
            "false" => ParamValue::Flag(false),
            other => ParamValue::Text(other.to_string()),
        })
    }
}

/// How a canonical parameter is rendered for one tool.
enum Mapping {
    /// `--flag` when the value is truthy.
    Switch(&'static str),
    /// `--flag 'value'`.
    Valued(&'static str),
    /// `--output 'value'`, optionally under the download directory.
    Output { prefix_download_dir: bool },
    Cookies,
    /// yt-dlp's remux pair, suppressed for audio-only downloads.
    RemuxMkv,
}

fn mapping_for(kind: BinaryKind, key: &str) -> Option<Mapping> {
    let mapping = match (kind, key) {
        (_, "use_cookies") => Mapping::Cookies,

        (BinaryKind::Ytdlp, "retry_stream") => Mapping::Valued("--wait-for-video"),
        (BinaryKind::Ytdlp, "threads") => Mapping::Valued("--concurrent-fragments"),
        (BinaryKind::Ytdlp, "wait_for_live") => Mapping::Switch("--live-from-start"),
        (BinaryKind::Ytdlp, "embed_thumbnail") => Mapping::Switch("--embed-thumbnail"),
        (BinaryKind::Ytdlp, "force_mkv") => Mapping::RemuxMkv,
        (BinaryKind::Ytdlp, "output_filename") => Mapping::Output {
            prefix_download_dir: false,
        },

        (BinaryKind::Ytarchive, "retry_stream") => Mapping::Valued("--retry-stream"),
        (BinaryKind::Ytarchive, "threads") => Mapping::Valued("--threads"),
        (BinaryKind::Ytarchive, "wait_for_live") => Mapping::Switch("--wait"),
        (BinaryKind::Ytarchive, "embed_thumbnail") => Mapping::Switch("--thumbnail"),
        (BinaryKind::Ytarchive, "force_mkv") => Mapping::Switch("--mkv"),
        (BinaryKind::Ytarchive, "output_filename") => Mapping::Output {
            prefix_download_dir: true,
        },

        _ => return None,
    };
    Some(mapping)
}

/// Watch URL for a video id.
pub fn video_url(video_id: &str) -> String {
    format!("https://youtu.be/{video_id}")
}

/// Single-quote a value for a POSIX shell.
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Build the full command line for one archiver run.
pub fn build_command(
    cfg: &ConfigFile,
    kind: BinaryKind,
    url: &str,
    quality: &str,
    params: &BTreeMap<String, ParamValue>,
) -> String {
    let mut cmd = shell_quote(&cfg.binaries.path_for(kind).to_string_lossy());

    for (key, value) in params.iter() {
        if key == CUSTOM_PARAMS_KEY {
            continue;
        }

        match mapping_for(kind, key) {
            Some(Mapping::Switch(flag)) => {
                if value.is_set() {
                    cmd.push_str(&format!(" {flag}"));
                }
            }
            Some(Mapping::Valued(flag)) => {
                cmd.push_str(&format!(" {flag} {}", shell_quote(&value.as_text())));
            }
            Some(Mapping::Output {
                prefix_download_dir,
            }) => {
                let name = value.as_text();
                let target = if prefix_download_dir {
                    format!("{}/{}", cfg.download_dir.trim_end_matches('/'), name)
                } else {
                    name
                };
                cmd.push_str(&format!(" --output {}", shell_quote(&target)));
            }
            Some(Mapping::Cookies) => {
                if value.is_set() {
                    cmd.push_str(&format!(
                        " --cookies {}",
                        shell_quote(&cfg.cookie_file.to_string_lossy())
                    ));
                }
            }
            Some(Mapping::RemuxMkv) => {
                if value.is_set() && quality != "audio_only" {
                    cmd.push_str(" --remux-video mkv --merge-output-format mkv");
                }
            }
            None => {
                warn!(param = %key, binary = %kind, "unmapped parameter; passing through");
                match value {
                    ParamValue::Flag(true) => cmd.push_str(&format!(" {key}")),
                    ParamValue::Flag(false) => {}
                    ParamValue::Text(text) => {
                        cmd.push_str(&format!(" {key} {}", shell_quote(text)));
                    }
                }
            }
        }
    }

    match kind {
        BinaryKind::Ytdlp => {
            cmd.push_str(&format!(" --paths {}", shell_quote(&cfg.download_dir)));
            match quality {
                "best" => {}
                "audio_only" => cmd.push_str(" -x --extract-audio"),
                other => {
                    let height = other.strip_suffix('p').unwrap_or(other);
                    cmd.push_str(&format!(
                        " -f {}",
                        shell_quote(&format!("bestvideo[height={height}]"))
                    ));
                }
            }
            cmd.push_str(" --progress --newline --no-colors");
            cmd.push_str(&format!(" {}", shell_quote(url)));
        }
        BinaryKind::Ytarchive => {
            cmd.push_str(&format!(" {} {}", shell_quote(url), shell_quote(quality)));
        }
    }

    cmd
}
