// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

use crate::command_line::ParamValue;
use crate::types::BinaryKind;

/// Command-line arguments for `archivist`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "archivist",
    version,
    about = "Archive livestreams with ytarchive or yt-dlp and follow their progress.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Without this flag `Archivist.toml` is used when present, otherwise
    /// built-in defaults.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Archiver to run.
    #[arg(long, value_enum, default_value_t = BinaryArg::Ytdlp)]
    pub binary: BinaryArg,

    /// Quality selector: `best`, `audio_only` or a height such as `1080p`.
    #[arg(long, default_value = "best")]
    pub quality: String,

    /// Archiver parameter, e.g. `--param wait_for_live=true`. Repeatable.
    #[arg(long = "param", value_name = "KEY=VALUE", value_parser = parse_param)]
    pub params: Vec<(String, ParamValue)>,

    /// Callback id to run on the finished file. Repeatable; runs in order.
    #[arg(long = "callback", value_name = "ID")]
    pub callbacks: Vec<String>,

    /// Milliseconds between status polls.
    #[arg(long, value_name = "MS", default_value_t = 1000)]
    pub poll_interval: u64,

    /// Print final statuses as JSON.
    #[arg(long)]
    pub json: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `ARCHIVIST_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Print the command lines that would run, without running them.
    #[arg(long)]
    pub dry_run: bool,

    /// List configured callback ids and exit.
    #[arg(long)]
    pub list_callbacks: bool,

    /// Video ids to archive; one job per id.
    #[arg(value_name = "VIDEO_ID", required_unless_present = "list_callbacks")]
    pub video_ids: Vec<String>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum BinaryArg {
    Ytarchive,
    Ytdlp,
}

impl From<BinaryArg> for BinaryKind {
    fn from(arg: BinaryArg) -> Self {
        match arg {
            BinaryArg::Ytarchive => BinaryKind::Ytarchive,
            BinaryArg::Ytdlp => BinaryKind::Ytdlp,
        }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

fn parse_param(s: &str) -> Result<(String, ParamValue), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty parameter name in '{s}'"));
    }
    let value = value.parse::<ParamValue>()?;
    Ok((key.to_string(), value))
}

pub fn parse() -> CliArgs {
    CliArgs::parse()
}
