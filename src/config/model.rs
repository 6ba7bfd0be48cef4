// src/config/model.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::types::{BinaryKind, DuplicatePolicy};

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [config]
/// grace_period = "5s"
/// duplicate_ids = "suffix"
/// download_dir = "/downloads"
///
/// [binaries]
/// ytdlp = "/opt/bin/yt-dlp"
///
/// [callback.probe]
/// cmd = "ffprobe -hide_banner {file}"
/// placement = "end"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default)]
    pub binaries: BinariesSection,

    /// Post-processing callbacks from `[callback.<id>]`, keyed by id.
    #[serde(default)]
    pub callback: BTreeMap<String, CallbackConfig>,
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// How long a cancelled job gets between SIGTERM and SIGKILL.
    #[serde(default = "default_grace_period")]
    pub grace_period: String,

    /// `"suffix"` or `"reject"`.
    #[serde(default = "default_duplicate_ids")]
    pub duplicate_ids: String,

    #[serde(default = "default_download_dir")]
    pub download_dir: String,

    #[serde(default)]
    pub cookie_file: Option<String>,

    /// Launcher used for job and callback command lines, e.g. `["sh", "-c"]`.
    #[serde(default)]
    pub shell: Option<Vec<String>>,
}

fn default_grace_period() -> String {
    "5s".to_string()
}

fn default_duplicate_ids() -> String {
    "suffix".to_string()
}

fn default_download_dir() -> String {
    "/downloads".to_string()
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            grace_period: default_grace_period(),
            duplicate_ids: default_duplicate_ids(),
            download_dir: default_download_dir(),
            cookie_file: None,
            shell: None,
        }
    }
}

/// `[binaries]` section. Paths are taken as already validated.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BinariesSection {
    #[serde(default)]
    pub ytarchive: Option<String>,

    #[serde(default)]
    pub ytdlp: Option<String>,
}

/// Where a callback's output lands relative to the job log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    Front,
    #[default]
    End,
}

/// `[callback.<id>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackConfig {
    /// Shell template; `{file}` is replaced by the quoted final file path.
    pub cmd: String,

    #[serde(default)]
    pub placement: Placement,

    /// Display key for the spliced block. Defaults to the callback id.
    #[serde(default)]
    pub label: Option<String>,
}

/// Program plus leading arguments used to run a command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for ShellSpec {
    fn default() -> Self {
        if cfg!(windows) {
            Self {
                program: "cmd".to_string(),
                args: vec!["/C".to_string()],
            }
        } else {
            Self {
                program: "sh".to_string(),
                args: vec!["-c".to_string()],
            }
        }
    }
}

/// Resolved locations of the two archivers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryPaths {
    pub ytarchive: PathBuf,
    pub ytdlp: PathBuf,
}

impl BinaryPaths {
    pub fn path_for(&self, kind: BinaryKind) -> &Path {
        match kind {
            BinaryKind::Ytarchive => &self.ytarchive,
            BinaryKind::Ytdlp => &self.ytdlp,
        }
    }
}

impl Default for BinaryPaths {
    fn default() -> Self {
        Self {
            ytarchive: PathBuf::from("./ytarchive"),
            ytdlp: PathBuf::from("./yt-dlp"),
        }
    }
}

/// Validated configuration used by the rest of the crate.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub grace_period: Duration,
    pub duplicate_policy: DuplicatePolicy,
    pub download_dir: String,
    pub cookie_file: PathBuf,
    pub shell: ShellSpec,
    pub binaries: BinaryPaths,
    pub callbacks: BTreeMap<String, CallbackConfig>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            grace_period: Duration::from_secs(5),
            duplicate_policy: DuplicatePolicy::default(),
            download_dir: default_download_dir(),
            cookie_file: PathBuf::from("./cookie.txt"),
            shell: ShellSpec::default(),
            binaries: BinaryPaths::default(),
            callbacks: BTreeMap::new(),
        }
    }
}

impl RawConfigFile {
    /// Apply the `YTARCHIVE_BIN`, `YTDLP_BIN` and `COOKIE_FILE` environment
    /// overrides on top of whatever the file said.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(path) = std::env::var("YTARCHIVE_BIN") {
            self.binaries.ytarchive = Some(path);
        }
        if let Ok(path) = std::env::var("YTDLP_BIN") {
            self.binaries.ytdlp = Some(path);
        }
        if let Ok(path) = std::env::var("COOKIE_FILE") {
            self.config.cookie_file = Some(path);
        }
        self
    }
}
